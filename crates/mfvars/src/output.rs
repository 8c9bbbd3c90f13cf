use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mfvars_client::{ChannelLifecycle, ChannelSet, SimValue, VariableSlot};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One variable as printed by `get`, `set --read` and `watch`.
#[derive(Debug, Clone, Serialize)]
pub struct VariableRow {
    pub name: String,
    pub definition_id: u32,
    pub offset: u32,
    pub value: Option<f32>,
    pub state: &'static str,
}

impl From<&VariableSlot> for VariableRow {
    fn from(slot: &VariableSlot) -> Self {
        Self {
            name: slot.name.clone(),
            definition_id: slot.id,
            offset: slot.offset,
            value: slot.value.as_f32(),
            state: value_state(slot.value),
        }
    }
}

fn value_state(value: SimValue) -> &'static str {
    match value {
        SimValue::Unknown => "unknown",
        SimValue::ConfirmedZero => "confirmed-zero",
        SimValue::Value(_) => "value",
    }
}

#[derive(Serialize)]
struct ReadingOutput<'a> {
    client: &'a str,
    lifecycle: ChannelLifecycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    reading: Option<u64>,
    variables: &'a [VariableRow],
}

#[derive(Serialize)]
struct SentOutput<'a> {
    client: &'a str,
    command_area: &'a str,
    expr: &'a str,
    sent: bool,
}

/// Print one reading of a set of variables. `reading` numbers watch passes.
pub fn print_variables(
    channels: &ChannelSet,
    reading: Option<u64>,
    rows: &[VariableRow],
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => {
            let out = ReadingOutput {
                client: &channels.client_name,
                lifecycle: channels.lifecycle,
                reading,
                variables: rows,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["VARIABLE", "ID", "OFFSET", "VALUE"]);
            for row in rows {
                table.add_row(vec![
                    row.name.clone(),
                    row.definition_id.to_string(),
                    row.offset.to_string(),
                    display_value(row),
                ]);
            }
            if let Some(reading) = reading {
                println!("reading {reading}");
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!("{} = {}", row.name, display_value(row));
            }
        }
    }
}

/// Confirm a fire-and-forget write.
pub fn print_sent(channels: &ChannelSet, expr: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SentOutput {
                client: &channels.client_name,
                command_area: &channels.command.area_name,
                expr,
                sent: true,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("sent '{expr}' to {}", channels.command.area_name);
        }
    }
}

fn display_value(row: &VariableRow) -> String {
    match row.value {
        Some(value) => value.to_string(),
        None => row.state.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(value: SimValue) -> VariableSlot {
        VariableSlot {
            name: "(L:A)".to_string(),
            id: 1000,
            offset: 0,
            value,
            ready: true,
        }
    }

    #[test]
    fn row_reflects_value_state() {
        let zero = VariableRow::from(&slot(SimValue::ConfirmedZero));
        assert_eq!(zero.value, Some(0.0));
        assert_eq!(zero.state, "confirmed-zero");

        let unknown = VariableRow::from(&slot(SimValue::Unknown));
        assert_eq!(unknown.value, None);
        assert_eq!(display_value(&unknown), "unknown");
    }

    #[test]
    fn json_reading_shape() {
        let channels = ChannelSet::well_known();
        let rows = vec![VariableRow::from(&slot(SimValue::Value(1234.5)))];
        let out = ReadingOutput {
            client: &channels.client_name,
            lifecycle: channels.lifecycle,
            reading: None,
            variables: &rows,
        };

        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["client"], "MobiFlight");
        assert_eq!(json["lifecycle"], "fixed");
        assert!(json.get("reading").is_none());
        assert_eq!(json["variables"][0]["value"], 1234.5);
        assert_eq!(json["variables"][0]["definition_id"], 1000);
    }
}

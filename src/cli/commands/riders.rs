use clap::Subcommand;

use super::authenticated_client;
use crate::cli::utils::{output_empty_collection, output_record, output_wizard_error};
use crate::cli::OutputFormat;
use crate::models::RiderId;
use crate::wizard::EnrollmentClient;

#[derive(Subcommand)]
pub enum RidersCommands {
    #[command(about = "List enrolled riders, newest first")]
    List,

    #[command(about = "Show everything recorded for one rider")]
    Show {
        #[arg(help = "Rider id")]
        id: String,
    },
}

pub async fn handle(cmd: RidersCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = authenticated_client()?;

    match cmd {
        RidersCommands::List => {
            let riders = match client.list_riders().await {
                Ok(riders) => riders,
                Err(e) => return output_wizard_error(&output_format, e),
            };

            if riders.is_empty() {
                return output_empty_collection(&output_format, "riders", "No riders enrolled yet");
            }

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&riders)?),
                OutputFormat::Text => {
                    println!("{:<38} {:<28} {:<32} {}", "RIDER ID", "NAME", "EMAIL", "CITY");
                    for rider in &riders {
                        let name = format!("{} {}", rider.info.first_name, rider.info.last_name);
                        println!(
                            "{:<38} {:<28} {:<32} {}",
                            rider.rider_id, name, rider.info.email, rider.info.city
                        );
                    }
                }
            }
            Ok(())
        }
        RidersCommands::Show { id } => {
            let rider_id: RiderId = id
                .parse()
                .map_err(|_| anyhow::anyhow!("'{}' is not a valid rider id", id))?;

            match client.fetch_rider(rider_id).await {
                Ok(record) => output_record(&output_format, &format!("Rider {}", rider_id), &record),
                Err(e) => output_wizard_error(&output_format, e),
            }
        }
    }
}

use clap::Subcommand;
use dutyplan_core::PlanStore;

use super::plan::print_plan;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List saved trips, newest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show a saved trip
    Show {
        /// Trip ID
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved trip
    Delete {
        /// Trip ID
        id: String,
    },
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = PlanStore::open()?;

    match action {
        HistoryAction::List { json } => {
            let trips = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&trips)?);
            } else if trips.is_empty() {
                println!("no saved trips");
            } else {
                for trip in trips {
                    let route = [
                        trip.labels.origin.as_deref(),
                        trip.labels.pickup.as_deref(),
                        trip.labels.dropoff.as_deref(),
                    ]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" -> ");
                    println!(
                        "{}  {}  {:>8.1} mi  {} day(s){}  {}",
                        trip.id,
                        trip.created_at.format("%Y-%m-%d %H:%M"),
                        trip.total_miles,
                        trip.actual_days,
                        if trip.restart_needed { ", restart" } else { "" },
                        route
                    );
                }
            }
        }
        HistoryAction::Show { id, json } => {
            let plan = store.load(&id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
        }
        HistoryAction::Delete { id } => {
            store.delete(&id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

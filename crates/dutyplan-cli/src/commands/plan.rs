//! Trip planning command.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use clap::Args;
use dutyplan_core::route::{RouteEstimator, StraightLineEstimator};
use dutyplan_core::{Config, Coordinate, PlanStore, StopLabels, TripPlan, TripPlanner, TripRequest};

#[derive(Args)]
pub struct PlanArgs {
    /// Total trip distance in miles
    #[arg(long, conflicts_with = "route", required_unless_present = "route")]
    miles: Option<f64>,
    /// Waypoints as lat,lon (current location, pickup, dropoff)
    #[arg(long, num_args = 2.., value_name = "LAT,LON")]
    route: Vec<Coordinate>,
    /// Hours already used in the current cycle
    #[arg(long, default_value = "0")]
    cycle_used: f64,
    /// Start of the first duty day ("YYYY-MM-DD HH:MM", RFC 3339, or a date)
    #[arg(long)]
    start: Option<String>,
    /// Current location label, kept with saved trips
    #[arg(long)]
    from: Option<String>,
    /// Pickup location label
    #[arg(long)]
    pickup: Option<String>,
    /// Dropoff location label
    #[arg(long)]
    dropoff: Option<String>,
    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
    /// Save the plan to history
    #[arg(long)]
    save: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let day_start = config.planner.day_start_time()?;

    let miles = match args.miles {
        Some(miles) => miles,
        None => {
            let estimate = StraightLineEstimator::new().estimate_miles(&args.route)?;
            tracing::debug!(legs = ?estimate.legs, "route estimate");
            estimate.total_miles
        }
    };

    let start = match args.start.as_deref() {
        Some(s) => parse_start(s, day_start)?,
        None => Local::now().date_naive().and_time(day_start),
    };

    let labels = StopLabels {
        origin: args.from,
        pickup: args.pickup,
        dropoff: args.dropoff,
    };
    let request = TripRequest::new(miles, args.cycle_used)
        .starting_at(start)
        .with_labels(labels.clone());
    let plan = TripPlanner::with_rules(config.rules)?.plan(&request)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }

    if args.save || config.planner.save_history {
        let id = PlanStore::open()?.save(&plan, &labels.into())?;
        // Keep stdout parseable in JSON mode.
        if args.json {
            eprintln!("saved: {id}");
        } else {
            println!("saved: {id}");
        }
    }
    Ok(())
}

fn parse_start(s: &str, day_start: chrono::NaiveTime) -> Result<NaiveDateTime, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(day_start))
        .map_err(|_| format!("cannot parse start time '{s}'"))
}

/// Human-readable day-by-day listing.
pub fn print_plan(plan: &TripPlan) {
    println!(
        "Trip: {:.1} mi, {:.2}h driving, {} day(s) (estimated {}), {} fuel stop(s)",
        plan.total_miles,
        plan.total_driving_hours,
        plan.actual_days,
        plan.estimated_days,
        plan.num_fuel_stops
    );
    println!(
        "Cycle: {:.2}h used before, {:.2}h after, restart: {}",
        plan.cycle_used_before,
        plan.cycle_used_after,
        if plan.restart_needed { "yes" } else { "no" }
    );
    if let (Some(depart), Some(arrive)) = (plan.departure(), plan.arrival()) {
        println!(
            "Depart {}, arrive {}",
            depart.format("%Y-%m-%d %H:%M"),
            arrive.format("%Y-%m-%d %H:%M")
        );
    }

    for day in &plan.daily_logs {
        println!();
        let kind = if day.is_restart { "  (restart)" } else { "" };
        println!("Day {}  {}{kind}", day.day_number, day.date);
        for entry in &day.log_entries {
            let location = entry
                .location
                .as_deref()
                .map(|l| format!(" @ {l}"))
                .unwrap_or_default();
            println!(
                "  {} - {}  {:<3} {:>6.2}h  {}{location}",
                entry.start_time.format("%m-%d %H:%M"),
                entry.end_time.format("%m-%d %H:%M"),
                entry.status.code(),
                entry.duration_hours,
                entry.notes,
            );
        }
        println!(
            "  driving {:.2}h, on duty {:.2}h, off duty {:.2}h, cycle left {:.2}h",
            day.total_driving_hours,
            day.total_on_duty_hours,
            day.total_off_duty_hours,
            day.cycle_hours_remaining
        );
    }
}

use chrono::{TimeDelta, Utc};
use sm2::{
    CardHistory, Parameters, Quality, Review, ReviewLog, RevlogEntry, Scheduler, SchedulerError,
};

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{} {}] {}", record.level(), record.target(), message))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn schedule_new_card() -> Result<(), Box<dyn std::error::Error>> {
    // Create a scheduler with the classic parameters
    let scheduler = Scheduler::new(Parameters::default())?;

    // A new card is due straight away
    let mut history = CardHistory::new(&scheduler);
    println!("New card due: {}", history.is_due(Utc::now()));

    // Review it four times, a few days apart, validating each quality first
    let start = Utc::now() - TimeDelta::days(30);
    for (day, quality) in [(0, 4), (1, 5), (3, 3), (10, 4)] {
        let quality = Quality::try_from(quality)?;
        let review = Review::new(start + TimeDelta::days(day), quality.get());
        let card = history.record(&scheduler, review)?;
        println!(
            "Review #{} (quality {}): next in {} days, easiness factor {}",
            card.review_count,
            quality.get(),
            card.interval,
            card.easiness_factor
        );
    }

    println!("Next review due: {:?}", history.card().due_at());
    println!("Due now: {}", history.is_due(Utc::now()));
    Ok(())
}

fn schedule_existing_card() -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = Scheduler::default();

    // Load the stored review rows: card 1 reviewed 3 times, last 7 days ago
    let start = Utc::now() - TimeDelta::days(14);
    let rows = [(0, 4), (1, 3), (7, 3)]
        .into_iter()
        .map(|(day, quality)| RevlogEntry {
            card_id: 1,
            reviewed_at: start + TimeDelta::days(day),
            answer_quality: quality,
        })
        .collect();
    let mut log = ReviewLog::from_entries(scheduler, rows)?;
    log.insert_card(2);
    let stored = *log.get(1).ok_or(SchedulerError::UnknownCard { card_id: 1 })?.card();

    println!("Due cards: {:?}", log.due_cards(Utc::now()));

    // Preview what each quality would do
    for quality in 0..=Quality::MAX.get() {
        let next = scheduler.review(&stored, quality);
        println!(
            "Quality {quality}: interval {} days, easiness factor {}",
            next.interval, next.easiness_factor
        );
    }

    // Assume the card was answered with quality 4
    let card = log.record(1, Review::now(4))?;
    println!("Next review due: {:?}", card.due_at());
    println!("Due cards: {:?}", log.due_cards(Utc::now()));
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger()?;

    println!("Scheduling a new card:");
    schedule_new_card()?;

    println!("\nScheduling an existing card:");
    schedule_existing_card()?;

    Ok(())
}

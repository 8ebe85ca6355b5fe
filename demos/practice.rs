//! # Practice
//!
//! Terminal drill: shows the upcoming notes and scores what you play, either
//! on a MIDI keyboard or by typing MIDI note numbers.
//!
//! **Concepts:** `Trainer` builder, progress file, `pump`, `press`, queue snapshots
//!
//! ```bash
//! cargo run --example practice --features midi-io,audio-out
//! ```

use sightread::prelude::*;
use std::io::BufRead;

fn print_queue(snapshot: &QueueSnapshot) {
    let cards: Vec<String> = snapshot.cards.iter().map(|card| card.label()).collect();
    println!(
        "[{}]  accuracy {}% ({}/{})",
        cards.join(" "),
        snapshot.accuracy(),
        snapshot.tally.correct_count,
        snapshot.tally.total_count
    );
}

fn main() -> sightread::Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::temp_dir().join("sightread-progress.json");
    let mut trainer = Trainer::builder()
        .pitch_range(48, 72)
        .progress_file(&path)
        .midi()
        .build()?;

    let status = trainer.midi_status();
    match status.error {
        Some(error) => println!("{error} - type MIDI note numbers instead"),
        None => println!("Listening on: {}", status.devices.join(", ")),
    }
    println!("Progress file: {}", path.display());
    println!("Commands: <midi number>, s (skip), m (mute), r (reset), q (quit)\n");

    let updates = trainer.subscribe_queue();
    print_queue(&trainer.snapshot());

    for line in std::io::stdin().lock().lines() {
        let line = line?;
        match line.trim() {
            "q" => break,
            "s" => trainer.skip(),
            "r" => trainer.reset(),
            "m" => println!("sound {}", if trainer.toggle_audio() { "on" } else { "off" }),
            input => match input.parse::<u8>() {
                Ok(pitch) if pitch <= 127 => {
                    let correct = trainer.press(pitch);
                    println!("{}", if correct { "correct" } else { "try again" });
                }
                _ => {}
            },
        }

        trainer.pump();
        if let Some(snapshot) = updates.try_iter().last() {
            print_queue(&snapshot);
        }
    }

    let summary = trainer.summary();
    println!(
        "\n{} notes practised, {:.0}% correct overall",
        summary.attempted_notes,
        summary.overall_rate() * 100.0
    );
    Ok(())
}

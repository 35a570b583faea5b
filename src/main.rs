use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use mastery::config::Config;
use mastery::db::Database;
use mastery::format::truncate;
use mastery::models::{ConfidenceLevel, JsonOutput};
use mastery::service::StudyService;
use mastery::store::SystemClock;
use mastery::tui;

const LOG_ENV: &str = "MASTERY_LOG";
const DEFAULT_LOG_FILTER: &str = "mastery=warn";

#[derive(Parser)]
#[command(name = "mastery")]
#[command(about = "Track concept mastery with Bayesian confidence and Leitner flashcards")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage hives (study contexts)
    #[command(subcommand)]
    Hive(HiveCommands),

    /// Manage concepts
    #[command(subcommand)]
    Concept(ConceptCommands),

    /// Manage flashcards
    #[command(subcommand)]
    Card(CardCommands),

    /// Grade a flashcard
    Review {
        /// Flashcard ID
        card: Uuid,

        /// unknown|known_little|known_fairly|known_well|mastered (or 0-4)
        #[arg(long, short, value_parser = ConfidenceLevel::parse)]
        level: ConfidenceLevel,

        /// How long the answer took, in milliseconds
        #[arg(long, default_value_t = 0)]
        time_ms: u32,
    },

    /// Record a quiz answer for a concept
    Quiz {
        /// Concept ID
        concept: Uuid,

        /// Question identifier
        #[arg(long, short)]
        question: String,

        /// The answer was correct
        #[arg(long, conflicts_with = "incorrect", required_unless_present = "incorrect")]
        correct: bool,

        /// The answer was wrong
        #[arg(long)]
        incorrect: bool,

        /// How long the answer took, in milliseconds
        #[arg(long, default_value_t = 0)]
        time_ms: u32,
    },

    /// Flashcards due for review
    Next {
        /// Only cards from this hive
        #[arg(long)]
        hive: Option<Uuid>,

        /// Maximum number of cards
        #[arg(long, short, default_value_t = 20)]
        limit: usize,

        /// Leave out cards in the top box
        #[arg(long)]
        exclude_mastered: bool,
    },

    /// Concepts that most need study
    Weak {
        /// Hive ID
        #[arg(long)]
        hive: Uuid,

        /// Confidence below which a concept counts as weak
        #[arg(long, short)]
        threshold: Option<f64>,

        /// Maximum number of concepts
        #[arg(long, short)]
        limit: Option<usize>,
    },

    /// Show mastery statistics for a hive
    Dashboard {
        /// Hive ID
        #[arg(long)]
        hive: Uuid,
    },

    /// Review history for a concept
    History {
        /// Concept ID
        concept: Uuid,
    },

    /// Launch interactive terminal UI
    Tui {
        /// Hive ID
        #[arg(long)]
        hive: Uuid,
    },
}

#[derive(Subcommand)]
enum HiveCommands {
    /// Create a hive
    Add {
        /// Hive name
        name: String,

        /// Hive description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// List hives, most recently used first
    List,

    /// Delete a hive with all its concepts, cards and history
    Delete {
        /// Hive ID
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum ConceptCommands {
    /// Add a concept to a hive
    Add {
        /// Hive ID
        #[arg(long)]
        hive: Uuid,

        /// Concept name
        name: String,

        /// Concept description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// List concepts in a hive
    List {
        /// Hive ID
        #[arg(long)]
        hive: Uuid,
    },

    /// Show concept details
    Show {
        /// Concept ID
        id: Uuid,
    },

    /// Delete a concept
    Delete {
        /// Concept ID
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum CardCommands {
    /// Add a flashcard to a concept
    Add {
        /// Concept ID
        #[arg(long)]
        concept: Uuid,

        /// Question side
        #[arg(long, short)]
        front: String,

        /// Answer side
        #[arg(long, short)]
        back: String,
    },

    /// List flashcards for a concept
    List {
        /// Concept ID
        concept: Uuid,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    if let Err(e) = run(cli) {
        if json {
            println!(
                "{}",
                serde_json::to_string(&JsonOutput::<()>::err(e.to_string()))
                    .unwrap_or_else(|_| String::from("{\"success\":false}"))
            );
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        1 => EnvFilter::new("mastery=debug"),
        _ => EnvFilter::new("mastery=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(data: T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(&JsonOutput::ok(data))?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db_path = config.database_path();
    debug!(path = %db_path.display(), strategy = config.engine.strategy.as_str(), "opening database");

    let db = Database::open(&db_path)?;
    db.init()?;
    let service = StudyService::from_config(db, &config, SystemClock);

    match cli.command {
        Commands::Init => {
            if cli.json {
                print_json(serde_json::json!({ "database": db_path }))?;
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Hive(hive_cmd) => match hive_cmd {
            HiveCommands::Add { name, description } => {
                let hive = service.create_hive(&name, description.as_deref())?;
                if cli.json {
                    print_json(&hive)?;
                } else {
                    println!("Added hive '{}' with ID: {}", hive.name, hive.id);
                }
            }

            HiveCommands::List => {
                let hives = service.list_hives()?;
                if cli.json {
                    print_json(&hives)?;
                } else if hives.is_empty() {
                    println!("No hives found.");
                } else {
                    println!("{:<38} {:<30} LAST USED", "ID", "NAME");
                    println!("{}", "-".repeat(80));
                    for hive in hives {
                        println!(
                            "{:<38} {:<30} {}",
                            hive.id,
                            truncate(&hive.name, 28),
                            hive.last_accessed_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }

            HiveCommands::Delete { id } => {
                service.delete_hive(id)?;
                if cli.json {
                    print_json(())?;
                } else {
                    println!("Hive {} deleted.", id);
                }
            }
        },

        Commands::Concept(concept_cmd) => match concept_cmd {
            ConceptCommands::Add {
                hive,
                name,
                description,
            } => {
                let concept = service.create_concept(hive, &name, description.as_deref())?;
                if cli.json {
                    print_json(&concept)?;
                } else {
                    println!("Added concept '{}' with ID: {}", concept.name, concept.id);
                }
            }

            ConceptCommands::List { hive } => {
                let concepts = service.concepts(hive)?;
                if cli.json {
                    print_json(&concepts)?;
                } else if concepts.is_empty() {
                    println!("No concepts found.");
                } else {
                    println!("{:<38} {:<30} {:>6} {:>7}  REVIEWED", "ID", "NAME", "NOW", "STORED");
                    println!("{}", "-".repeat(96));
                    for view in concepts {
                        println!(
                            "{:<38} {:<30} {:>5.1}% {:>6.1}%  {}",
                            view.concept.id,
                            truncate(&view.concept.name, 28),
                            view.current_confidence * 100.0,
                            view.concept.confidence * 100.0,
                            format_time(view.concept.last_reviewed_at)
                        );
                    }
                }
            }

            ConceptCommands::Show { id } => {
                let view = service.concept_view(id)?;
                let cards = service.flashcards_for_concept(id)?;
                let history = service.review_history(id)?;

                if cli.json {
                    print_json(serde_json::json!({
                        "concept": view,
                        "flashcards": cards,
                        "history": history
                    }))?;
                } else {
                    let concept = &view.concept;
                    println!("Concept: {}", concept.name);
                    println!("ID: {}", concept.id);
                    if let Some(desc) = &concept.description {
                        println!("Description: {}", desc);
                    }
                    println!(
                        "Confidence: {:.1}% now ({:.1}% at last review)",
                        view.current_confidence * 100.0,
                        concept.confidence * 100.0
                    );
                    println!("Last reviewed: {}", format_time(concept.last_reviewed_at));

                    println!();
                    println!("--- Flashcards ({}) ---", cards.len());
                    for card in &cards {
                        println!(
                            "[box {}] {}  (next: {})",
                            card.leitner_box,
                            truncate(&card.front, 50),
                            card.next_review_at()
                                .map(|t| t.format("%Y-%m-%d").to_string())
                                .unwrap_or_else(|| "now".to_string())
                        );
                    }

                    println!();
                    println!("--- Recent reviews ---");
                    for event in history.iter().take(5) {
                        println!(
                            "{}  {:<9} {:>5.0}%",
                            event.timestamp.format("%Y-%m-%d %H:%M"),
                            event.target_type.as_str(),
                            event.outcome * 100.0
                        );
                    }
                }
            }

            ConceptCommands::Delete { id } => {
                service.delete_concept(id)?;
                if cli.json {
                    print_json(())?;
                } else {
                    println!("Concept {} deleted.", id);
                }
            }
        },

        Commands::Card(card_cmd) => match card_cmd {
            CardCommands::Add {
                concept,
                front,
                back,
            } => {
                let card = service.add_flashcard(concept, &front, &back)?;
                if cli.json {
                    print_json(&card)?;
                } else {
                    println!("Added flashcard with ID: {}", card.id);
                }
            }

            CardCommands::List { concept } => {
                let cards = service.flashcards_for_concept(concept)?;
                if cli.json {
                    print_json(&cards)?;
                } else if cards.is_empty() {
                    println!("No flashcards found.");
                } else {
                    println!("{:<38} {:<4} {:<40} NEXT", "ID", "BOX", "FRONT");
                    println!("{}", "-".repeat(96));
                    for card in cards {
                        println!(
                            "{:<38} {:<4} {:<40} {}",
                            card.id,
                            card.leitner_box,
                            truncate(&card.front, 38),
                            card.next_review_at()
                                .map(|t| t.format("%Y-%m-%d").to_string())
                                .unwrap_or_else(|| "now".to_string())
                        );
                    }
                }
            }
        },

        Commands::Review {
            card,
            level,
            time_ms,
        } => {
            let outcome = service.review_flashcard(card, level, time_ms)?;
            if cli.json {
                print_json(&outcome)?;
            } else {
                println!("Recorded '{}' for '{}'", level.label(), outcome.concept.name);
                println!(
                    "Confidence: {:.1}%",
                    outcome.concept.confidence * 100.0
                );
                println!(
                    "Card moved to box {} (next review: {})",
                    outcome.flashcard.leitner_box,
                    format_time(outcome.flashcard.next_review_at())
                );
            }
        }

        Commands::Quiz {
            concept,
            question,
            correct,
            incorrect,
            time_ms,
        } => {
            let was_correct = correct && !incorrect;
            let outcome = service.submit_quiz_result(concept, &question, was_correct, time_ms)?;
            if cli.json {
                print_json(&outcome)?;
            } else {
                println!(
                    "Recorded {} answer for '{}'",
                    if was_correct { "correct" } else { "incorrect" },
                    outcome.concept.name
                );
                println!(
                    "Confidence: {:.1}%",
                    outcome.concept.confidence * 100.0
                );
            }
        }

        Commands::Next {
            hive,
            limit,
            exclude_mastered,
        } => {
            let cards = service.next_review_items(hive, !exclude_mastered, limit)?;
            if cli.json {
                print_json(&cards)?;
            } else if cards.is_empty() {
                println!("Nothing due. Come back later!");
            } else {
                println!("=== Due for Review ({}) ===", cards.len());
                println!();
                for card in cards {
                    println!("[box {}] {}", card.leitner_box, card.front);
                    println!("        {}", card.id);
                }
                println!();
                println!("Grade with: mastery review <ID> --level <unknown|little|fairly|well|mastered>");
            }
        }

        Commands::Weak {
            hive,
            threshold,
            limit,
        } => {
            let weak = match (threshold, limit) {
                (None, None) => service.weak_concepts(hive)?,
                (threshold, limit) => service.weak_concepts_with(
                    hive,
                    threshold.unwrap_or(config.priority.threshold),
                    limit.unwrap_or(config.priority.limit),
                )?,
            };
            if cli.json {
                print_json(&weak)?;
            } else if weak.is_empty() {
                println!("No weak concepts. Nice work!");
            } else {
                println!("{:<30} {:>8} {:>6}  RECOMMENDATION", "CONCEPT", "PRIORITY", "CONF");
                println!("{}", "-".repeat(96));
                for w in weak {
                    println!(
                        "{:<30} {:>8.3} {:>5.1}%  {}",
                        truncate(&w.concept.name, 28),
                        w.priority,
                        w.concept.confidence * 100.0,
                        w.recommendation.message()
                    );
                }
            }
        }

        Commands::Dashboard { hive } => {
            let hive_record = service.open_hive(hive)?;
            let overview = service.dashboard(hive)?;
            if cli.json {
                print_json(&overview)?;
            } else {
                let summary = &overview.summary;
                println!("=== {} ===", hive_record.name);
                println!("Concepts: {}", summary.total_concepts);
                match summary.average_confidence {
                    Some(avg) => println!("Average confidence: {:.1}%", avg * 100.0),
                    None => println!("Average confidence: -"),
                }
                println!("Due flashcards: {}", overview.due_flashcards);
                println!("Reviews (last 7 days): {}", overview.recent_reviews);
                println!();
                println!("--- Mastery ---");
                let dist = &summary.distribution;
                println!("Beginner   (<30%):   {}", dist.beginner);
                println!("Learning   (30-60%): {}", dist.learning);
                println!("Proficient (60-80%): {}", dist.proficient);
                println!("Mastered   (80%+):   {}", dist.mastered);
                if !overview.weakest.is_empty() {
                    println!();
                    println!("--- Weakest ---");
                    for concept in &overview.weakest {
                        println!(
                            "{:<30} {:>5.1}%",
                            truncate(&concept.name, 28),
                            concept.confidence * 100.0
                        );
                    }
                }
            }
        }

        Commands::History { concept } => {
            let events = service.review_history(concept)?;
            if cli.json {
                print_json(&events)?;
            } else if events.is_empty() {
                println!("No reviews yet.");
            } else {
                println!("{:<17} {:<9} {:>7} {:>8}  TARGET", "WHEN", "TYPE", "OUTCOME", "TIME");
                println!("{}", "-".repeat(80));
                for event in events {
                    println!(
                        "{:<17} {:<9} {:>6.0}% {:>7.1}s  {}",
                        event.timestamp.format("%Y-%m-%d %H:%M"),
                        event.target_type.as_str(),
                        event.outcome * 100.0,
                        f64::from(event.response_time_ms) / 1000.0,
                        truncate(&event.target_id, 36)
                    );
                }
            }
        }

        Commands::Tui { hive } => {
            tui::run(service, hive)?;
        }
    }

    Ok(())
}

fn format_time(at: Option<chrono::DateTime<chrono::Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const ID: &str = "67e55044-10b1-426f-9247-bb680e5fe0c8";

    fn id() -> Uuid {
        Uuid::parse_str(ID).unwrap()
    }

    mod cli_parse_tests {
        use super::*;

        #[test]
        fn parse_init() {
            let cli = Cli::try_parse_from(["mastery", "init"]).unwrap();
            assert!(matches!(cli.command, Commands::Init));
            assert!(!cli.json);
            assert_eq!(cli.verbose, 0);
        }

        #[test]
        fn parse_global_flags_after_subcommand() {
            let cli = Cli::try_parse_from(["mastery", "hive", "list", "--json", "-vv"]).unwrap();
            assert!(cli.json);
            assert_eq!(cli.verbose, 2);
            assert!(matches!(cli.command, Commands::Hive(HiveCommands::List)));
        }

        #[test]
        fn parse_hive_add() {
            let cli =
                Cli::try_parse_from(["mastery", "hive", "add", "Pharmacology", "-d", "Year 2"])
                    .unwrap();
            match cli.command {
                Commands::Hive(HiveCommands::Add { name, description }) => {
                    assert_eq!(name, "Pharmacology");
                    assert_eq!(description, Some("Year 2".to_string()));
                }
                _ => panic!("Expected Hive Add command"),
            }
        }

        #[test]
        fn parse_concept_add() {
            let cli = Cli::try_parse_from(["mastery", "concept", "add", "--hive", ID, "Beta blockers"])
                .unwrap();
            match cli.command {
                Commands::Concept(ConceptCommands::Add {
                    hive,
                    name,
                    description,
                }) => {
                    assert_eq!(hive, id());
                    assert_eq!(name, "Beta blockers");
                    assert!(description.is_none());
                }
                _ => panic!("Expected Concept Add command"),
            }
        }

        #[test]
        fn parse_rejects_malformed_id() {
            assert!(Cli::try_parse_from(["mastery", "concept", "show", "42"]).is_err());
        }

        #[test]
        fn parse_card_add() {
            let cli = Cli::try_parse_from([
                "mastery", "card", "add", "--concept", ID, "-f", "Front", "-b", "Back",
            ])
            .unwrap();
            match cli.command {
                Commands::Card(CardCommands::Add {
                    concept,
                    front,
                    back,
                }) => {
                    assert_eq!(concept, id());
                    assert_eq!(front, "Front");
                    assert_eq!(back, "Back");
                }
                _ => panic!("Expected Card Add command"),
            }
        }

        #[test]
        fn parse_review_with_alias_level() {
            let cli = Cli::try_parse_from(["mastery", "review", ID, "--level", "well"]).unwrap();
            match cli.command {
                Commands::Review {
                    card,
                    level,
                    time_ms,
                } => {
                    assert_eq!(card, id());
                    assert_eq!(level, ConfidenceLevel::KnownWell);
                    assert_eq!(time_ms, 0);
                }
                _ => panic!("Expected Review command"),
            }
        }

        #[test]
        fn parse_review_numeric_level() {
            let cli = Cli::try_parse_from(["mastery", "review", ID, "-l", "0", "--time-ms", "1500"])
                .unwrap();
            match cli.command {
                Commands::Review { level, time_ms, .. } => {
                    assert_eq!(level, ConfidenceLevel::Unknown);
                    assert_eq!(time_ms, 1500);
                }
                _ => panic!("Expected Review command"),
            }
        }

        #[test]
        fn parse_review_rejects_unknown_level() {
            assert!(Cli::try_parse_from(["mastery", "review", ID, "--level", "perfect"]).is_err());
        }

        #[test]
        fn parse_quiz_requires_a_verdict() {
            assert!(Cli::try_parse_from(["mastery", "quiz", ID, "-q", "q1"]).is_err());
            assert!(
                Cli::try_parse_from(["mastery", "quiz", ID, "-q", "q1", "--correct", "--incorrect"])
                    .is_err()
            );
        }

        #[test]
        fn parse_quiz_incorrect() {
            let cli =
                Cli::try_parse_from(["mastery", "quiz", ID, "-q", "q1", "--incorrect"]).unwrap();
            match cli.command {
                Commands::Quiz {
                    question,
                    correct,
                    incorrect,
                    ..
                } => {
                    assert_eq!(question, "q1");
                    assert!(!correct);
                    assert!(incorrect);
                }
                _ => panic!("Expected Quiz command"),
            }
        }

        #[test]
        fn parse_next_defaults() {
            let cli = Cli::try_parse_from(["mastery", "next"]).unwrap();
            match cli.command {
                Commands::Next {
                    hive,
                    limit,
                    exclude_mastered,
                } => {
                    assert!(hive.is_none());
                    assert_eq!(limit, 20);
                    assert!(!exclude_mastered);
                }
                _ => panic!("Expected Next command"),
            }
        }

        #[test]
        fn parse_weak_with_overrides() {
            let cli = Cli::try_parse_from([
                "mastery", "weak", "--hive", ID, "--threshold", "0.5", "-l", "3",
            ])
            .unwrap();
            match cli.command {
                Commands::Weak {
                    hive,
                    threshold,
                    limit,
                } => {
                    assert_eq!(hive, id());
                    assert_eq!(threshold, Some(0.5));
                    assert_eq!(limit, Some(3));
                }
                _ => panic!("Expected Weak command"),
            }
        }

        #[test]
        fn parse_dashboard_requires_hive() {
            assert!(Cli::try_parse_from(["mastery", "dashboard"]).is_err());
            assert!(Cli::try_parse_from(["mastery", "dashboard", "--hive", ID]).is_ok());
        }

        #[test]
        fn parse_tui() {
            let cli = Cli::try_parse_from(["mastery", "tui", "--hive", ID]).unwrap();
            assert!(matches!(cli.command, Commands::Tui { hive } if hive == id()));
        }
    }
}

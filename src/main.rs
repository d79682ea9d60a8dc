use clap::Parser;
use docuvet::config::ScoreSourceKind;
use docuvet::models::DocumentProcessingResult;
use docuvet::{Config, DocumentProcessor};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "docuvet", about = "Identity document extraction and validation")]
struct Args {
    /// Path to the document image
    image: PathBuf,

    /// Print the result as JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Use the bounded-random demo score source instead of signal analysis
    #[arg(long)]
    demo_scores: bool,
}

fn print_detailed_report(result: &DocumentProcessingResult) {
    println!("\n===============================================");
    println!("      DOCUMENT VALIDATION DETAILED REPORT");
    println!("===============================================\n");

    let validation = &result.validation;
    println!("EXTRACTED DATA:");
    println!("  Name: {}", validation.extracted_data.name);
    println!("  Document Number: {}", validation.extracted_data.document_number);
    println!("  Expiration Date: {}", validation.extracted_data.expiration_date);
    println!("  Document Type: {}", validation.document_type);

    println!("\nFRAUD DETECTION CHECKS:");
    for check in &validation.fraud_detection_results {
        println!(
            "  - {}: {} (confidence {:.3}) {}",
            check.check,
            if check.passed { "PASSED" } else { "FAILED" },
            check.confidence,
            check.details
        );
    }

    println!("\nFACE DETECTION:");
    println!(
        "  Face detected: {} (confidence {:.3}, {} landmarks)",
        result.face_detection.face_detected,
        result.face_detection.confidence,
        result.face_detection.landmarks.len()
    );

    println!(
        "\nDocument validation result: {} (overall confidence {:.3})",
        if validation.is_valid { "VALID" } else { "INVALID" },
        validation.confidence
    );
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::from_env();
    if args.demo_scores {
        config.score_source = ScoreSourceKind::RandomStub;
    }

    let mut processor = DocumentProcessor::new(config);
    match processor.process(&args.image) {
        Ok(result) => {
            if args.json {
                match serde_json::to_string_pretty(&result) {
                    Ok(rendered) => println!("{}", rendered),
                    Err(err) => {
                        eprintln!("Failed to render result: {}", err);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print_detailed_report(&result);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error processing document: {}", err);
            ExitCode::FAILURE
        }
    }
}

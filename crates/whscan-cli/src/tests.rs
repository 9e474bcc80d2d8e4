use std::time::Duration;

use clap::Parser;
use whscan_scraper::PoolOptions;

use super::*;

#[test]
fn parses_enumerate_range() {
    let cli = Cli::try_parse_from(["whscan", "enumerate", "--start", "1", "--end", "1999"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Enumerate {
            source: IdentifierSource {
                start: Some(1),
                end: Some(1999),
                input_file: None,
            },
            min_valid_bytes: None,
            ..
        }
    ));
}

#[test]
fn enumerate_requires_a_source() {
    assert!(Cli::try_parse_from(["whscan", "enumerate"]).is_err());
}

#[test]
fn enumerate_start_without_end_is_rejected() {
    assert!(Cli::try_parse_from(["whscan", "enumerate", "--start", "5"]).is_err());
}

#[test]
fn enumerate_range_conflicts_with_input_file() {
    let result = Cli::try_parse_from([
        "whscan",
        "enumerate",
        "--start",
        "1",
        "--end",
        "2",
        "--input-file",
        "ids.txt",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_enumerate_input_file_and_flags() {
    let cli = Cli::try_parse_from([
        "whscan",
        "enumerate",
        "--input-file",
        "ids.txt",
        "--concurrency",
        "20",
        "--min-valid-bytes",
        "30000",
        "--retry-errors",
        "--include-unmatched",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Enumerate {
            source,
            scan,
            min_valid_bytes,
        } => {
            assert_eq!(source.input_file, Some(PathBuf::from("ids.txt")));
            assert_eq!(scan.concurrency, Some(20));
            assert_eq!(min_valid_bytes, Some(30_000));
            assert!(scan.retry_errors);
            assert!(scan.include_unmatched);
            assert!(scan.resume());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn resume_is_default_and_no_resume_disables_it() {
    let cli = Cli::try_parse_from(["whscan", "markdown", "--input-file", "p.json"]).unwrap();
    let Commands::Markdown { scan, .. } = cli.command else {
        panic!("expected markdown command");
    };
    assert!(scan.resume());

    let cli = Cli::try_parse_from([
        "whscan",
        "markdown",
        "--input-file",
        "p.json",
        "--no-resume",
    ])
    .unwrap();
    let Commands::Markdown { scan, .. } = cli.command else {
        panic!("expected markdown command");
    };
    assert!(!scan.resume());

    let cli = Cli::try_parse_from([
        "whscan",
        "markdown",
        "--input-file",
        "p.json",
        "--no-resume",
        "--resume",
    ])
    .unwrap();
    let Commands::Markdown { scan, .. } = cli.command else {
        panic!("expected markdown command");
    };
    assert!(scan.resume(), "last flag wins");
}

#[test]
fn markdown_requires_input_file() {
    assert!(Cli::try_parse_from(["whscan", "markdown"]).is_err());
}

#[test]
fn parses_geo_nearest_with_negative_longitude() {
    let cli = Cli::try_parse_from([
        "whscan", "geo", "nearest", "--lat", "34.05", "--lon", "-118.24", "-k", "3",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Geo {
            warehouses: None,
            command: GeoCommands::Nearest { lat, lon, k },
        } => {
            assert!((lat - 34.05).abs() < 1e-9);
            assert!((lon + 118.24).abs() < 1e-9);
            assert_eq!(k, 3);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parses_geo_lookup_and_state() {
    let cli = Cli::try_parse_from(["whscan", "geo", "lookup", "428", "1021"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Geo {
            command: GeoCommands::Lookup { ref numbers },
            ..
        } if numbers == &[428, 1021]
    ));

    let cli = Cli::try_parse_from(["whscan", "geo", "--warehouses", "w.json", "state", "CA"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Geo {
            warehouses: Some(_),
            command: GeoCommands::State { ref code },
        } if code == "CA"
    ));
}

#[test]
fn geo_lookup_requires_a_number() {
    assert!(Cli::try_parse_from(["whscan", "geo", "lookup"]).is_err());
}

#[test]
fn parses_geo_search_query() {
    let cli = Cli::try_parse_from(["whscan", "geo", "search", "san jose"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Geo {
            command: GeoCommands::Search { ref query },
            ..
        } if query == "san jose"
    ));
}

#[test]
fn nearest_k_defaults_to_five() {
    let cli =
        Cli::try_parse_from(["whscan", "geo", "nearest", "--lat", "1", "--lon", "2"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Geo {
            command: GeoCommands::Nearest { k: 5, .. },
            ..
        }
    ));
}

#[test]
fn scan_flags_override_pool_options() {
    let args = ScanArgs {
        concurrency: Some(0),
        delay_ms: Some(250),
        ..ScanArgs::default()
    };
    let options = args.pool_options(PoolOptions::default());
    assert_eq!(options.concurrency, 1, "concurrency is clamped to at least 1");
    assert_eq!(options.batch_delay, Duration::from_millis(250));
    assert_eq!(options.checkpoint_every, PoolOptions::default().checkpoint_every);

    let untouched = ScanArgs::default().pool_options(PoolOptions::default());
    assert_eq!(untouched, PoolOptions::default());
}

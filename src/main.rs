use std::fs;
use std::io;
use std::process;
use std::thread;

use bytesize::ByteSize;
use clap::ArgEnum;
use env_logger;
use log;

use news_analysis::aggregate::MonthlyReport;
use news_analysis::loader::merge_sources;
use news_analysis::{Algorithm, Analyzer, AnalyzerBuilder, Article, Backend, Metrics, SearchMethod, SortKey};

/// Quicksort recursion may reach the number of records on sorted or duplicate-heavy input.
const ANALYSIS_STACK_SIZE: usize = 512 * 1024 * 1024;

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let worker = thread::Builder::new()
        .name("analysis".to_string())
        .stack_size(ANALYSIS_STACK_SIZE)
        .spawn(move || run(&arg_parser));

    let worker = match worker {
        Ok(worker) => worker,
        Err(err) => {
            log::error!("analysis thread spawning error: {}", err);
            process::exit(1);
        }
    };

    if worker.join().is_err() {
        log::error!("analysis thread panicked");
        process::exit(1);
    }
}

fn run(arg_parser: &clap::ArgMatches) {
    match arg_parser.subcommand() {
        Some(("clean", args)) => clean(args),
        Some(("sort", args)) => sort(&build_analyzer(arg_parser, |builder| builder), args),
        Some(("count", args)) => count(&build_analyzer(arg_parser, |builder| builder), args),
        Some(("search", args)) => search(&build_analyzer(arg_parser, |builder| builder), args),
        Some(("political", args)) => {
            let analyzer = build_analyzer(arg_parser, |builder| {
                builder
                    .with_target_year(args.value_of_t_or_exit("year"))
                    .with_political_subject(args.value_of("subject").expect("value is required"))
            });
            political(&analyzer, args);
        }
        Some(("words", args)) => {
            let analyzer = build_analyzer(arg_parser, |builder| {
                builder
                    .with_top_n(args.value_of_t_or_exit("top"))
                    .with_government_keyword(args.value_of("keyword").expect("value is required"))
                    .with_stop_words(args.is_present("stop_words"))
            });
            words(&analyzer);
        }
        _ => unreachable!("subcommand is required"),
    }
}

fn clean(args: &clap::ArgMatches) {
    let fake = open_input(args.value_of("fake").expect("value is required"));
    let truth = open_input(args.value_of("true").expect("value is required"));

    let output = args.value_of("output").expect("value is required");
    let output_stream = match fs::File::create(output) {
        Ok(file) => io::BufWriter::new(file),
        Err(err) => {
            log::error!("output file creation error: {}", err);
            process::exit(1);
        }
    };

    let summary = match merge_sources(fake, truth, output_stream) {
        Ok(summary) => summary,
        Err(err) => {
            log::error!("data cleaning error: {}", err);
            process::exit(1);
        }
    };
    println!(
        "cleaning complete: {} records written to {}, {} malformed records dropped",
        summary.accepted, output, summary.dropped
    );

    if let Some(snapshot) = args.value_of("snapshot_output") {
        let analyzer = match AnalyzerBuilder::new().load(open_input(output)) {
            Ok(analyzer) => analyzer,
            Err(err) => {
                log::error!("cleaned data loading error: {}", err);
                process::exit(1);
            }
        };
        match analyzer.write_snapshot(snapshot) {
            Ok(written) => println!("snapshot saved: {} records written to {}", written, snapshot),
            Err(err) => {
                log::error!("snapshot saving error: {}", err);
                process::exit(1);
            }
        }
    }
}

fn build_analyzer<F>(arg_parser: &clap::ArgMatches, configure: F) -> Analyzer
where
    F: FnOnce(AnalyzerBuilder) -> AnalyzerBuilder,
{
    let backend: BackendArg = arg_parser.value_of_t_or_exit("backend");
    let capacity: usize = arg_parser.value_of_t_or_exit("capacity");

    let builder = configure(
        AnalyzerBuilder::new()
            .with_backend(backend.into())
            .with_capacity_limit(capacity),
    );

    let analyzer = match (arg_parser.value_of("snapshot"), arg_parser.value_of("input")) {
        (Some(snapshot), _) => builder.from_snapshot(snapshot).unwrap_or_else(|err| {
            log::error!("snapshot loading error: {}", err);
            process::exit(1);
        }),
        (None, Some(input)) => builder.load(open_input(input)).unwrap_or_else(|err| {
            log::error!("data loading error: {}", err);
            process::exit(1);
        }),
        (None, None) => {
            log::error!("either --input or --snapshot is required");
            process::exit(1);
        }
    };

    let summary = analyzer.load_summary();
    println!(
        "{} store: {} records loaded, {} malformed dropped, {} ignored over the limit, footprint {}",
        analyzer.backend(),
        summary.accepted,
        summary.dropped,
        summary.ignored,
        ByteSize::b(analyzer.footprint() as u64)
    );
    print_metrics(analyzer.load_metrics());

    return analyzer;
}

fn sort(analyzer: &Analyzer, args: &clap::ArgMatches) {
    let algorithm: AlgorithmArg = args.value_of_t_or_exit("algorithm");
    let key: KeyArg = args.value_of_t_or_exit("key");
    let head: usize = args.value_of_t_or_exit("head");

    let outcome = match analyzer.sort(algorithm.into(), key.into()) {
        Some(outcome) => outcome,
        None => {
            log::error!("{} is not available for the {} backend", Algorithm::from(algorithm), analyzer.backend());
            process::exit(1);
        }
    };

    for article in outcome.articles.iter().take(head) {
        print_article(article);
    }
    println!(
        "{} by {:?}: {} comparisons, max recursion depth {}, {} recursive calls",
        outcome.algorithm, outcome.key, outcome.stats.comparisons, outcome.stats.max_depth, outcome.stats.recursive_calls
    );
    print_metrics(&outcome.metrics);
}

fn count(analyzer: &Analyzer, args: &clap::ArgMatches) {
    let measured = match analyzer.count_labels(args.is_present("recursive")) {
        Some(measured) => measured,
        None => {
            log::error!("recursive counting is not available for the {} backend", analyzer.backend());
            process::exit(1);
        }
    };

    let counts = measured.value;
    println!("total: {}, fake: {}, true: {}", counts.total, counts.fake, counts.real);
    print_metrics(&measured.metrics);
}

fn search(analyzer: &Analyzer, args: &clap::ArgMatches) {
    let outcome = match args.value_of("title") {
        Some(title) => analyzer.search_title(title),
        None => {
            let method: MethodArg = args.value_of_t_or_exit("method");
            analyzer.search_year(args.value_of_t_or_exit("year"), method.into())
        }
    };

    if outcome.articles.is_empty() {
        println!("no matches");
    }
    for article in outcome.articles.iter() {
        print_article(article);
    }
    println!("{} matches ({:?} search)", outcome.articles.len(), outcome.method);
    print_metrics(&outcome.metrics);
}

fn political(analyzer: &Analyzer, args: &clap::ArgMatches) {
    let grouping: Option<AlgorithmArg> = args
        .is_present("grouped")
        .then(|| args.value_of_t_or_exit("grouped"));

    let measured = analyzer.political_report(grouping.map(Algorithm::from));
    print_report(&measured.value);
    print_metrics(&measured.metrics);
}

fn words(analyzer: &Analyzer) {
    let measured = analyzer.government_words();

    for (rank, entry) in measured.value.iter().enumerate() {
        println!("{:>3}. {:<20} {}", rank + 1, entry.word, entry.count);
    }
    print_metrics(&measured.metrics);
}

fn print_article(article: &Article) {
    println!("{} | {} | {} | {}", article.date(), article.label(), article.subject(), article.title());
}

fn print_report(report: &MonthlyReport) {
    for bucket in report.buckets.iter() {
        match bucket.percentage() {
            Some(percentage) => println!(
                "{:04}-{:02}: {:6.2}% fake ({} of {})",
                report.year, bucket.month, percentage, bucket.fake, bucket.total
            ),
            None => println!("{:04}-{:02}: no data", report.year, bucket.month),
        }
    }
    match report.overall_percentage() {
        Some(percentage) => println!("overall: {:.2}% fake ({} of {})", percentage, report.fake(), report.total()),
        None => println!("overall: no data"),
    }
}

fn print_metrics(metrics: &Metrics) {
    match metrics.memory_delta_bytes() {
        Some(delta) if delta < 0 => println!(
            "{}: {}us, memory -{}",
            metrics.operation(),
            metrics.duration_micros(),
            ByteSize::b(delta.unsigned_abs())
        ),
        Some(delta) => println!(
            "{}: {}us, memory +{}",
            metrics.operation(),
            metrics.duration_micros(),
            ByteSize::b(delta as u64)
        ),
        None => println!("{}: {}us", metrics.operation(), metrics.duration_micros()),
    }
}

fn open_input(path: &str) -> io::BufReader<fs::File> {
    match fs::File::open(path) {
        Ok(file) => io::BufReader::new(file),
        Err(err) => {
            log::error!("input file {} opening error: {}", path, err);
            process::exit(1);
        }
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as clap::ArgEnum>::from_str(s, false)
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum BackendArg {
    Array,
    List,
}

impl BackendArg {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for BackendArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <BackendArg as clap::ArgEnum>::from_str(s, false)
    }
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Array => Backend::Array,
            BackendArg::List => Backend::List,
        }
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum AlgorithmArg {
    Quick,
    Insertion,
    Selection,
    Merge,
    Bubble,
}

impl AlgorithmArg {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for AlgorithmArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <AlgorithmArg as clap::ArgEnum>::from_str(s, false)
    }
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Quick => Algorithm::Quick,
            AlgorithmArg::Insertion => Algorithm::Insertion,
            AlgorithmArg::Selection => Algorithm::Selection,
            AlgorithmArg::Merge => Algorithm::Merge,
            AlgorithmArg::Bubble => Algorithm::Bubble,
        }
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum KeyArg {
    Year,
    Title,
    Date,
}

impl KeyArg {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for KeyArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <KeyArg as clap::ArgEnum>::from_str(s, false)
    }
}

impl From<KeyArg> for SortKey {
    fn from(arg: KeyArg) -> Self {
        match arg {
            KeyArg::Year => SortKey::Year,
            KeyArg::Title => SortKey::Title,
            KeyArg::Date => SortKey::Date,
        }
    }
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum MethodArg {
    Linear,
    Binary,
}

impl MethodArg {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for MethodArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <MethodArg as clap::ArgEnum>::from_str(s, false)
    }
}

impl From<MethodArg> for SearchMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Linear => SearchMethod::Linear,
            MethodArg::Binary => SearchMethod::Binary,
        }
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("news-analysis")
        .about("sorting, searching and word-frequency analysis of a labeled news dataset")
        .setting(clap::AppSettings::SubcommandRequiredElseHelp)
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("cleaned dataset file")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("snapshot")
                .short('s')
                .long("snapshot")
                .help("store snapshot file, used instead of the dataset file")
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("backend")
                .short('b')
                .long("backend")
                .help("record store backend")
                .takes_value(true)
                .default_value("array")
                .possible_values(BackendArg::possible_values()),
        )
        .arg(
            clap::Arg::new("capacity")
                .short('c')
                .long("capacity")
                .help("maximum number of records to load")
                .takes_value(true)
                .default_value("50000"),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LogLevel::possible_values()),
        )
        .subcommand(
            clap::App::new("clean")
                .about("merges raw fake and true sources into a cleaned dataset")
                .arg(
                    clap::Arg::new("fake")
                        .long("fake")
                        .help("raw fake news file")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::new("true")
                        .long("true")
                        .help("raw true news file")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    clap::Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("cleaned dataset file")
                        .takes_value(true)
                        .default_value("DataCleaned.csv"),
                )
                .arg(
                    clap::Arg::new("snapshot_output")
                        .long("snapshot-output")
                        .help("also save the cleaned records as a store snapshot")
                        .takes_value(true),
                ),
        )
        .subcommand(
            clap::App::new("sort")
                .about("sorts a copy of the store")
                .arg(
                    clap::Arg::new("algorithm")
                        .short('a')
                        .long("algorithm")
                        .help("sorting algorithm")
                        .takes_value(true)
                        .default_value("merge")
                        .possible_values(AlgorithmArg::possible_values()),
                )
                .arg(
                    clap::Arg::new("key")
                        .short('k')
                        .long("key")
                        .help("sorting key")
                        .takes_value(true)
                        .default_value("year")
                        .possible_values(KeyArg::possible_values()),
                )
                .arg(
                    clap::Arg::new("head")
                        .long("head")
                        .help("number of sorted records to print")
                        .takes_value(true)
                        .default_value("10"),
                ),
        )
        .subcommand(
            clap::App::new("count")
                .about("counts true and fake articles")
                .arg(
                    clap::Arg::new("recursive")
                        .short('r')
                        .long("recursive")
                        .help("count recursively"),
                ),
        )
        .subcommand(
            clap::App::new("search")
                .about("finds articles by publication year or exact title")
                .arg(
                    clap::Arg::new("year")
                        .short('y')
                        .long("year")
                        .help("publication year")
                        .takes_value(true)
                        .required_unless_present("title"),
                )
                .arg(
                    clap::Arg::new("title")
                        .short('t')
                        .long("title")
                        .help("exact title, searched with a binary search")
                        .takes_value(true)
                        .conflicts_with("year"),
                )
                .arg(
                    clap::Arg::new("method")
                        .short('m')
                        .long("method")
                        .help("year search method")
                        .takes_value(true)
                        .default_value("linear")
                        .possible_values(MethodArg::possible_values()),
                ),
        )
        .subcommand(
            clap::App::new("political")
                .about("monthly fake percentage of political news")
                .arg(
                    clap::Arg::new("year")
                        .short('y')
                        .long("year")
                        .help("report year")
                        .takes_value(true)
                        .default_value("2016"),
                )
                .arg(
                    clap::Arg::new("subject")
                        .long("subject")
                        .help("subject filter")
                        .takes_value(true)
                        .default_value("politics"),
                )
                .arg(
                    clap::Arg::new("grouped")
                        .short('g')
                        .long("grouped")
                        .help("build the report by sorting by month with this algorithm")
                        .takes_value(true)
                        .possible_values(AlgorithmArg::possible_values()),
                ),
        )
        .subcommand(
            clap::App::new("words")
                .about("most frequent words of fake government news")
                .arg(
                    clap::Arg::new("top")
                        .short('n')
                        .long("top")
                        .help("number of words to report")
                        .takes_value(true)
                        .default_value("10"),
                )
                .arg(
                    clap::Arg::new("keyword")
                        .long("keyword")
                        .help("subject filter")
                        .takes_value(true)
                        .default_value("government"),
                )
                .arg(
                    clap::Arg::new("stop_words")
                        .long("skip-stop-words")
                        .help("ignore common english words"),
                ),
        )
        .get_matches()
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(match log_level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        })
        .format_timestamp_millis()
        .init();
}

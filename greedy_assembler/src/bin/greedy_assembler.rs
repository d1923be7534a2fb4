extern crate clap;
extern crate env_logger;
extern crate greedy_assembler;
#[macro_use]
extern crate log;
extern crate serde_json;
use clap::{App, Arg, ArgMatches};
use greedy_assembler::fasta::{self, AmbiguityPolicy};
use greedy_assembler::*;
use std::io::{BufWriter, Write};

fn init_logger(matches: &ArgMatches) -> std::io::Result<()> {
    let level = match matches.occurrences_of("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    match matches.value_of("logs") {
        None => {}
        Some("cout") | Some("stdout") => {
            builder.target(env_logger::Target::Stdout);
        }
        Some(path) => {
            let file = std::fs::File::create(path)?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
    }
    builder.init();
    Ok(())
}

fn parse_num<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<T> {
    let value = matches.value_of(name).unwrap_or_default();
    value.parse().map_err(|_| {
        AssemblyError::InvalidConfig(format!("{} requires a numeric argument, got {}", name, value))
    })
}

fn config_from(matches: &ArgMatches) -> Result<AssemblyConfig> {
    let required_score: u32 = parse_num(matches, "required_score")?;
    let threads: usize = parse_num(matches, "threads")?;
    let mut config = AssemblyConfig::new(required_score, threads);
    if matches.is_present("gpu") {
        let platform: usize = parse_num(matches, "platform")?;
        let device: usize = parse_num(matches, "device")?;
        let work_group_size: usize = parse_num(matches, "work_group_size")?;
        config = config.with_device(platform, device, work_group_size);
    }
    config.validate()?;
    Ok(config)
}

fn write_contigs<W: Write>(wtr: &mut W, contigs: &[AssembledContig]) -> std::io::Result<()> {
    for (idx, contig) in contigs.iter().enumerate() {
        writeln!(
            wtr,
            ">contig_{} reads={} {}",
            idx,
            contig.reads.len(),
            contig.reads.join(",")
        )?;
        writeln!(wtr, "{}", contig.seq)?;
    }
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<()> {
    info!("[STEP]\tInitialisation");
    let config = config_from(matches)?;
    info!("=== Infos ===\n{}", config);
    let aligner = Aligner::new(DEFAULT_SCHEME);
    let backend = build_backend(&config, aligner)?;
    info!("[STEP]\tData gathering");
    let policy = match matches.value_of("ambiguity") {
        Some("random") | None => AmbiguityPolicy::Random {
            seed: parse_num(matches, "seed")?,
        },
        Some(other) => other.parse()?,
    };
    let file = matches.value_of("file").unwrap_or_default();
    let records = fasta::parse_into_vec(file, policy)?;
    info!("nbReads = {}", records.len());
    let reads = fasta::encode_records(&records)?;
    info!("[STEP]\tCycles");
    let mut assembler = Assembler::new(&reads, aligner, &config, backend.as_ref())?;
    let report = assembler.run()?.clone();
    info!(
        "{} cycles, {} merges, {} contigs.",
        report.num_cycles(),
        report.total_merges(),
        assembler.store().num_contigs()
    );
    let contigs = assembler.contigs();
    match matches.value_of("output") {
        Some(path) => {
            let mut wtr = BufWriter::new(std::fs::File::create(path)?);
            write_contigs(&mut wtr, &contigs)?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut wtr = BufWriter::new(stdout.lock());
            write_contigs(&mut wtr, &contigs)?;
        }
    }
    if let Some(path) = matches.value_of("summary") {
        let mut wtr = BufWriter::new(std::fs::File::create(path)?);
        let summary = serde_json::ser::to_string(&report).map_err(std::io::Error::from)?;
        writeln!(wtr, "{}", summary)?;
    }
    Ok(())
}

fn main() {
    let matches = App::new("greedy_assembler")
        .version("0.1.0")
        .about("De novo assembly of short reads by greedy pairwise merging.")
        .arg(
            Arg::with_name("file")
                .short("f")
                .long("file")
                .value_name("READS")
                .help("Reads<FASTA>")
                .required_unless("device_infos")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("logs")
                .short("l")
                .long("log")
                .value_name("PATH")
                .help("Destination of logs. 'cout' or 'stdout' for the standard output.")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("required_score")
                .short("s")
                .long("required-score")
                .value_name("SCORE")
                .help("Minimal absolute score to merge two contigs. (0,100].")
                .default_value(&"60")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("threads")
                .short("t")
                .long("threads")
                .value_name("THREADS")
                .help("Number of threads, the main one included.")
                .default_value(&"1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("gpu")
                .short("g")
                .long("gpu")
                .help("Compute the score matrix on the compute device."),
        )
        .arg(
            Arg::with_name("device_infos")
                .short("i")
                .long("device-infos")
                .help("List the compute platforms and devices, then exit."),
        )
        .arg(
            Arg::with_name("platform")
                .short("p")
                .long("platform")
                .value_name("ID")
                .help("Platform id of the compute device.")
                .default_value(&"0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("device")
                .short("d")
                .long("device")
                .value_name("ID")
                .help("Device id of the compute device.")
                .default_value(&"0")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("work_group_size")
                .short("w")
                .long("work-group-size")
                .value_name("SIZE")
                .help("Number of cells in a work group.")
                .default_value(&"1")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("ambiguity")
                .short("a")
                .long("ambiguity")
                .value_name("POLICY")
                .help("How to resolve ambiguous bases.")
                .possible_values(&["random", "first", "reject"])
                .default_value(&"random")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed for resolving ambiguous bases at random.")
                .default_value(&"24039880")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("PATH")
                .help("Contigs<FASTA>. Default: the standard output.")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("summary")
                .long("summary")
                .value_name("PATH")
                .help("Summary of the cycles<JSON>.")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Output debug to the log destination."),
        )
        .get_matches();
    if let Err(why) = init_logger(&matches) {
        eprintln!("Failed to open the log destination: {}", why);
        std::process::exit(1);
    }
    if matches.is_present("device_infos") {
        println!("=== Device infos ===");
        println!("{}", list_available_devices());
        return;
    }
    if let Err(why) = run(&matches) {
        error!("{}", why);
        eprintln!("{}", why);
        std::process::exit(1);
    }
}

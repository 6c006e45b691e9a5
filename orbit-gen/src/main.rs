extern crate argparse;
extern crate poncelet;
extern crate rand;
extern crate serde_json;
extern crate tracing;
extern crate tracing_subscriber;

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};

use argparse::{ArgumentParser, Store, StoreTrue};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use poncelet::sweep;
use poncelet::{Orbit, OrbitError, OrbitParams};

#[derive(Clone)]
struct Conf {
    params: OrbitParams,
    thread_count: usize,
    output: String,
    from_stdin: bool,
    random_seeds: usize,
    sweep_rotation: usize,
}

impl fmt::Display for Conf {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Conf{{
    params: {},
    thread_count: {},
    output: {},
    from_stdin: {},
    random_seeds: {},
    sweep_rotation: {}
}}",
            serde_json::to_string(&self.params).unwrap_or_default(),
            self.thread_count,
            if self.output.is_empty() { "-" } else { self.output.as_str() },
            self.from_stdin,
            self.random_seeds,
            self.sweep_rotation
        )
    }
}

impl Conf {
    fn sources_selected(&self) -> usize {
        [self.from_stdin, self.random_seeds > 0, self.sweep_rotation > 0]
            .iter()
            .filter(|&&set| set)
            .count()
    }

    fn source_name(&self) -> &'static str {
        if self.from_stdin {
            "--stdin"
        } else if self.random_seeds > 0 {
            "--random-seeds"
        } else if self.sweep_rotation > 0 {
            "--sweep-rotation"
        } else {
            "the flags"
        }
    }
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("orbit_gen=info,poncelet=info")),
        )
        .init();

    let defaults = OrbitParams::default();
    let mut conf = Conf {
        params: defaults,
        thread_count: 3,
        output: String::new(),
        from_stdin: false,
        random_seeds: 0,
        sweep_rotation: 0,
    };
    {
        let mut argparse = ArgumentParser::new();
        argparse.set_description("Compute Poncelet orbits and print them as JSON lines");
        argparse.refer(&mut conf.params.p).add_option(
            &["--center-x"],
            Store,
            "x coordinate of the ellipse centre (default 0.4)",
        );
        argparse.refer(&mut conf.params.q).add_option(
            &["--center-y"],
            Store,
            "y coordinate of the ellipse centre (default -0.2)",
        );
        argparse.refer(&mut conf.params.w).add_option(
            &["--semi-major"],
            Store,
            "Semi-axis along the rotated x axis (default 0.5)",
        );
        argparse.refer(&mut conf.params.h).add_option(
            &["--semi-minor"],
            Store,
            "Semi-axis along the rotated y axis (default 0.25)",
        );
        argparse.refer(&mut conf.params.t).add_option(
            &["--rotation"],
            Store,
            "Rotation of the ellipse in radians (default pi/5)",
        );
        argparse.refer(&mut conf.params.x_initial).add_option(
            &["--seed-x"],
            Store,
            "x coordinate of the seed point (default 0)",
        );
        argparse.refer(&mut conf.params.y_initial).add_option(
            &["--seed-y"],
            Store,
            "y coordinate of the seed point (default 1)",
        );
        argparse.refer(&mut conf.params.n).add_option(
            &["-n", "--count"],
            Store,
            "Number of points in each orbit (default 17)",
        );
        argparse.refer(&mut conf.thread_count).add_option(
            &["-t", "--threads"],
            Store,
            "Number of threads to use (default 3)",
        );
        argparse.refer(&mut conf.output).add_option(
            &["-o", "--output"],
            Store,
            "File to write the orbits to (default stdout)",
        );
        argparse.refer(&mut conf.from_stdin).add_option(
            &["--stdin"],
            StoreTrue,
            "Read one JSON parameter record per line from stdin instead of using the flags",
        );
        argparse.refer(&mut conf.random_seeds).add_option(
            &["--random-seeds"],
            Store,
            "Compute this many orbits from random seeds on the unit circle",
        );
        argparse.refer(&mut conf.sweep_rotation).add_option(
            &["--sweep-rotation"],
            Store,
            "Compute this many orbits with the rotation spread over [0, pi)",
        );
        argparse.parse_args_or_exit();
    }
    info!("{}", conf);

    let requests = build_requests(&conf)?;
    info!("Computing {} orbits", requests.len());
    let results = sweep::compute_all(requests, conf.thread_count);

    let failed = if conf.output.is_empty() {
        let stdout = io::stdout();
        let handle = stdout.lock();
        write_results(handle, &results)?
    } else {
        info!("Write to json file: {}", conf.output);
        write_results(BufWriter::new(File::create(&conf.output)?), &results)?
    };
    info!(
        "Finished: {} orbits written, {} failed",
        results.len() - failed,
        failed
    );
    Ok(())
}

/// Picks the request source. `--stdin` wins over `--random-seeds`, which wins over
/// `--sweep-rotation`.
fn build_requests(conf: &Conf) -> io::Result<Vec<OrbitParams>> {
    if conf.sources_selected() > 1 {
        warn!(
            "--stdin, --random-seeds and --sweep-rotation are exclusive; using {}",
            conf.source_name()
        );
    }
    if conf.from_stdin {
        return read_requests(io::stdin().lock());
    }
    if conf.random_seeds > 0 {
        let mut rng = rand::thread_rng();
        return Ok(sweep::random_seeds(&conf.params, conf.random_seeds, &mut rng));
    }
    if conf.sweep_rotation > 0 {
        return Ok(sweep::rotation_sweep(&conf.params, conf.sweep_rotation));
    }
    Ok(vec![conf.params])
}

/// Reads one parameter record per non-blank line.
fn read_requests<R: BufRead>(reader: R) -> io::Result<Vec<OrbitParams>> {
    let mut requests = vec![];
    for line in reader.lines() {
        let line = line?;
        if line.trim() == "" {
            continue;
        }
        let params: OrbitParams = serde_json::from_str(line.as_str())?;
        requests.push(params);
    }
    Ok(requests)
}

/// Writes one JSON object per result and returns how many of them failed.
fn write_results<W: Write>(
    mut out: W,
    results: &[Result<Orbit, OrbitError>],
) -> io::Result<usize> {
    let mut failed = 0;
    for (index, result) in results.iter().enumerate() {
        let record = match result {
            Ok(orbit) => serde_json::json!({ "index": index, "orbit": orbit }),
            Err(err) => {
                error!("orbit {} failed: {}", index, err);
                failed += 1;
                serde_json::json!({ "index": index, "error": err.to_string() })
            }
        };
        writeln!(out, "{}", record)?;
    }
    out.flush()?;
    Ok(failed)
}

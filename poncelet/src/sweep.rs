use std::cmp::{max, min};
use std::f64::consts::PI;
use std::thread;

use crossbeam_channel::unbounded;
use rand::Rng;
use tracing::{debug, warn};

use crate::error::OrbitError;
use crate::orbit::{Orbit, OrbitParams};

/// Computes every request on `thread_count` worker threads.
///
/// Each worker takes its own copy of a request and hands back a freshly built orbit, so nothing is
/// shared between workers. Results come back in request order.
pub fn compute_all(
    requests: Vec<OrbitParams>,
    thread_count: usize,
) -> Vec<Result<Orbit, OrbitError>> {
    let total = requests.len();
    let thread_count = max(1, min(thread_count, total));
    debug!(
        "Spawning {} threads for {} orbit requests",
        thread_count, total
    );

    let (job_tx, job_rx) = unbounded();
    for job in requests.into_iter().enumerate() {
        if job_tx.send(job).is_err() {
            break;
        }
    }
    drop(job_tx);

    let (result_tx, result_rx) = unbounded();
    let mut children = vec![];
    for idx in 0..thread_count {
        let jobs = job_rx.clone();
        let results = result_tx.clone();
        let child = thread::spawn(move || {
            debug!("Thread {} started", idx);
            for (slot, params) in jobs.iter() {
                if results.send((slot, params.compute())).is_err() {
                    break;
                }
            }
            debug!("Thread {} finished", idx);
        });
        children.push(child);
    }
    drop(result_tx);

    let mut slots: Vec<Option<Result<Orbit, OrbitError>>> = vec![None; total];
    for (slot, result) in result_rx.iter() {
        slots[slot] = Some(result);
    }
    for child in children {
        if child.join().is_err() {
            warn!("an orbit worker panicked");
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.unwrap_or(Err(OrbitError::Abandoned { index })))
        .collect()
}

/// `count` copies of `base`, each seeded at a uniformly random point of the unit circle.
pub fn random_seeds<R: Rng>(base: &OrbitParams, count: usize, rng: &mut R) -> Vec<OrbitParams> {
    (0..count)
        .map(|_| {
            let (y, x) = (rng.gen::<f64>() * 2.0 * PI).sin_cos();
            OrbitParams {
                x_initial: x,
                y_initial: y,
                ..*base
            }
        })
        .collect()
}

/// `steps` copies of `base` with the rotation spread evenly over [0, π).
pub fn rotation_sweep(base: &OrbitParams, steps: usize) -> Vec<OrbitParams> {
    (0..steps)
        .map(|i| OrbitParams {
            t: PI * i as f64 / steps as f64,
            ..*base
        })
        .collect()
}

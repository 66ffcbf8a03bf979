mod support;

use std::{collections::HashSet, num::NonZeroUsize, sync::Arc, time::Duration};

use bindcheck_core::{Identity, Orchestrator, Reporter, Tally};
use support::{
    CONNECTION_REFUSED, Chaotic, Echo, HoldOne, ReverseOrder, SharedBuffer,
    Unreachable, WrongId, fast_settings, run_with,
};

fn summary_lines(matched: u64, wrong: u64, failed: u64) -> Vec<String> {
    vec![
        format!("Successful results: {matched}"),
        format!("Wrong results: {wrong}"),
        format!("Exceptions: {failed}"),
    ]
}

#[tokio::test]
async fn empty_population_prints_only_zero_summary() {
    let run = run_with(Arc::new(Echo::default()), fast_settings(0)).await;

    assert_eq!(run.tally, Tally::default());
    assert_eq!(run.lines, summary_lines(0, 0, 0));
}

#[tokio::test]
async fn single_matching_worker() {
    let run = run_with(Arc::new(Echo::default()), fast_settings(1)).await;

    assert_eq!(run.status_lines(), ["0\tSuccess"]);
    assert_eq!(run.summary(), summary_lines(1, 0, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wrong_backend_marks_every_identity_wrong() {
    let run = run_with(Arc::new(WrongId), fast_settings(5)).await;

    assert_eq!(run.status_lines().len(), 5);
    assert!(
        run.status_lines()
            .iter()
            .all(|line| line.ends_with("\tWrong result"))
    );
    assert_eq!(run.summary(), summary_lines(0, 5, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unreachable_backend_reports_connection_error() {
    let run = run_with(Arc::new(Unreachable), fast_settings(3)).await;

    let mut lines = run.status_lines().to_vec();
    lines.sort();
    let expected: Vec<String> = (0..3)
        .map(|id| format!("{id}\t{CONNECTION_REFUSED}"))
        .collect();
    assert_eq!(lines, expected);
    assert_eq!(run.summary(), summary_lines(0, 0, 3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn large_population_reports_each_identity_once() {
    const POPULATION: u32 = 2000;
    let backend = Arc::new(Chaotic::default());
    let run = run_with(Arc::clone(&backend), fast_settings(POPULATION)).await;

    assert_eq!(run.tally.total(), u64::from(POPULATION));
    assert_eq!(
        run.tally,
        Tally {
            matched: 1400,
            mismatched: 400,
            failed: 200,
        }
    );

    let mut seen = HashSet::new();
    for line in run.status_lines() {
        let (id, _) = line.split_once('\t').expect("tab separated line");
        let id: u32 = id.parse().expect("numeric identity");
        assert!(seen.insert(id), "identity {id} reported twice");
    }
    assert_eq!(seen, (0..POPULATION).collect::<HashSet<_>>());

    let calls = backend.calls.lock().expect("calls lock");
    assert_eq!(calls.len(), POPULATION as usize, "one attempt per worker");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn loop_terminates_when_workers_finish_out_of_order() {
    const POPULATION: u32 = 40;
    let backend = Arc::new(ReverseOrder {
        population: POPULATION,
        step: Duration::from_millis(2),
    });
    let run = run_with(backend, fast_settings(POPULATION)).await;

    assert_eq!(run.tally.matched, u64::from(POPULATION));
    let first: Identity = run.status_lines()[0]
        .split_once('\t')
        .and_then(|(id, _)| id.parse().ok())
        .map(Identity::new)
        .expect("first line");
    assert!(first.get() > 0, "highest identities should report first");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn results_stream_before_all_workers_finish() {
    const POPULATION: u32 = 10;
    let held = Identity::new(0);
    let backend = Arc::new(HoldOne::new(held));
    let out = SharedBuffer::default();
    let orchestrator =
        Orchestrator::new(Arc::clone(&backend), fast_settings(POPULATION));

    // Everyone but the held worker must be on the page while it is still
    // running; it is released either way so the run can end.
    let observe = async {
        let reported = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let lines = out.lines();
                if lines.len() >= (POPULATION - 1) as usize {
                    return lines;
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await;
        backend.release();
        reported
    };
    let (tally, reported) =
        tokio::join!(orchestrator.run(Reporter::new(out.clone())), observe);

    let reported =
        reported.expect("other outcomes should be written while one is held");
    assert_eq!(reported.len(), (POPULATION - 1) as usize);
    assert!(
        reported.iter().all(|line| line.ends_with("\tSuccess")),
        "no summary before the held worker finishes: {reported:?}"
    );
    assert!(!reported.iter().any(|line| line.starts_with("0\t")));

    let tally = tally.expect("run should complete");
    assert_eq!(tally.matched, u64::from(POPULATION));
    let lines = out.lines();
    assert_eq!(lines[(POPULATION - 1) as usize], "0\tSuccess");
    assert_eq!(
        lines[POPULATION as usize..],
        summary_lines(POPULATION.into(), 0, 0)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_cap_still_covers_population() {
    let settings =
        fast_settings(50).with_max_in_flight(NonZeroUsize::new(3));
    let backend = Arc::new(Echo {
        delay: Duration::from_millis(1),
    });
    let run = run_with(backend, settings).await;

    assert_eq!(run.summary(), summary_lines(50, 0, 0));
}

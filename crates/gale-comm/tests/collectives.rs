//! Collective behaviour shared by every backend.

use gale_comm::{Communicator, SingleProcess, ThreadComm};
use gale_core::Rank;

fn spawn_all<T, F>(group: Vec<ThreadComm>, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(Box<dyn Communicator>) -> T + Send + Copy + 'static,
{
    let handles: Vec<_> = group
        .into_iter()
        .map(|comm| std::thread::spawn(move || f(Box::new(comm))))
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).collect()
}

#[test]
fn every_rank_sees_identical_bits() {
    let results = spawn_all(ThreadComm::group(4), |comm| {
        let r = comm.rank().0 as f64;
        let mut buf = [0.1 * r, 1e-17 * r, 1.0 / (r + 1.0)];
        comm.all_reduce_sum(&mut buf).unwrap();
        buf.map(f64::to_bits)
    });
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn owners_subgroup_after_world_reduce() {
    let results = spawn_all(ThreadComm::group(3), |comm| {
        let mut count = [1.0];
        comm.all_reduce_sum(&mut count).unwrap();
        let sub = comm.subgroup(&[Rank(0), Rank(1)]).unwrap();
        let reduced = sub.map(|sub| {
            let mut rows = vec![0.0; 4];
            rows[sub.rank().0 * 2] = 7.0;
            rows[sub.rank().0 * 2 + 1] = -1.0;
            sub.all_reduce_sum(&mut rows).unwrap();
            rows
        });
        (count[0], reduced)
    });
    assert_eq!(results[0], (3.0, Some(vec![7.0, -1.0, 7.0, -1.0])));
    assert_eq!(results[1], (3.0, Some(vec![7.0, -1.0, 7.0, -1.0])));
    assert_eq!(results[2], (3.0, None));
}

#[test]
fn single_process_is_its_own_root() {
    let comm = SingleProcess;
    assert!(comm.is_root());
    let sub = comm.subgroup(&[Rank(0)]).unwrap().unwrap();
    let mut buf = [2.0, 3.0];
    sub.all_reduce_sum(&mut buf).unwrap();
    assert_eq!(buf, [2.0, 3.0]);
}

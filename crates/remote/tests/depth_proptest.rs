mod common;

use common::{cache, depth, key, params};
use emberlink_remote::{SubXactEvent, XactEvent};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Use the connection at the current local level
    Acquire,
    /// Start a local subtransaction
    Enter,
    /// End the innermost subtransaction
    Leave(SubXactEvent),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => Just(Step::Acquire),
        2 => Just(Step::Enter),
        1 => Just(Step::Leave(SubXactEvent::PreCommit)),
        1 => Just(Step::Leave(SubXactEvent::Abort)),
    ]
}

/// Savepoints opened and released so far, from the driver log.
fn savepoint_balance(log: &[String]) -> (usize, usize) {
    let pushed = log.iter().filter(|c| c.starts_with("SAVEPOINT ")).count();
    let popped = log
        .iter()
        .filter(|c| c.starts_with("RELEASE SAVEPOINT "))
        .count();
    (pushed, popped)
}

proptest! {
    #[test]
    fn prop_remote_depth_tracks_local_nesting(
        steps in prop::collection::vec(step(), 0..40),
        commit in any::<bool>(),
    ) {
        let (mut cache, driver) = cache();
        let k = key("fb");
        let mut level = 1u32;
        let mut expected = 0u32;
        let mut aborted = false;

        for step in steps {
            match step {
                Step::Acquire => {
                    cache.acquire(&k, &params(), level).unwrap();
                    expected = expected.max(level);
                }
                Step::Enter => level += 1,
                Step::Leave(_) if level == 1 => {}
                Step::Leave(event) => {
                    cache.on_subxact_event(event, level).unwrap();
                    if expected >= level {
                        expected = level - 1;
                        aborted |= event == SubXactEvent::Abort;
                    }
                    level -= 1;
                }
            }
            prop_assert!(depth(&cache, &k) <= level);
            prop_assert_eq!(depth(&cache, &k), expected);
            if let Some(entry) = cache.entry(&k) {
                prop_assert_eq!(entry.had_error(), aborted);
            }
            if expected >= 1 {
                let (pushed, popped) = savepoint_balance(&driver.log());
                prop_assert_eq!(pushed - popped, expected as usize - 1);
            }
        }

        while level > 1 {
            cache.on_subxact_event(SubXactEvent::Abort, level).unwrap();
            level -= 1;
        }
        let event = if commit { XactEvent::PreCommit } else { XactEvent::Abort };
        cache.on_xact_event(event).unwrap();

        prop_assert_eq!(depth(&cache, &k), 0);
        prop_assert!(!cache.xact_got_connection());
        if let Some(entry) = cache.entry(&k) {
            prop_assert!(!entry.had_error());
        }
    }
}

use access_review_core::{AccessReview, BatchPhase};
use access_review_test_fixtures::{
    MockChecker, MockOutcome, namespaced_request, proptest_config::test_cases,
};
use access_review_types::PermissionRequest;
use proptest::prelude::*;

const VERBS: [&str; 4] = ["get", "list", "patch", "delete"];

fn request(index: usize) -> PermissionRequest {
    namespaced_request("pods", "default", VERBS[index])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(test_cases()))]

    /// Any batch settles with one result per input, in input order, after one
    /// check per distinct request
    #[test]
    fn settled_batch_mirrors_input(
        picks in prop::collection::vec(0..VERBS.len(), 0..10),
        verdicts in prop::collection::vec(any::<bool>(), VERBS.len()),
    ) {
        let mut checker = MockChecker::new();
        for (index, allowed) in verdicts.iter().enumerate() {
            let outcome = if *allowed { MockOutcome::Allow } else { MockOutcome::Deny };
            checker = checker.with_outcome(&request(index), outcome);
        }
        let checker = checker.into_arc();
        let requests: Vec<_> = picks.iter().map(|&i| request(i)).collect();

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (state, phase) = runtime.block_on(async {
            let review = AccessReview::builder().checker(checker.clone()).build();
            let mut batch = review.evaluate(requests.clone());
            let state = batch.settled().await;
            (state, batch.phase())
        });

        prop_assert_eq!(phase, BatchPhase::Settled);
        prop_assert!(!state.pending);
        prop_assert_eq!(state.results.len(), picks.len());
        for (result, &pick) in state.results.iter().zip(&picks) {
            prop_assert_eq!(&result.request, &request(pick));
            prop_assert_eq!(result.allowed, verdicts[pick]);
        }

        let mut distinct = picks.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(checker.call_count(), distinct.len());
    }
}

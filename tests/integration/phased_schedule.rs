//! End-to-end phase extraction scenarios over hand-built plan shapes.

use phasor::{
    extract_phases, FragmentId, JoinDistribution, JoinVariant, Phase, PlanFragment, PlanOperator,
    ScheduleError, TransferMode,
};

fn table_scan(id: u32) -> PlanFragment {
    PlanFragment::leaf(FragmentId(id))
}

fn exchange(id: u32, sources: &[u32]) -> PlanFragment {
    PlanFragment::new(
        FragmentId(id),
        PlanOperator::RemoteSource {
            sources: sources.iter().map(|&s| FragmentId(s)).collect(),
            mode: TransferMode::Partitioned,
        },
    )
}

fn union(id: u32, sources: &[u32]) -> PlanFragment {
    PlanFragment::new(
        FragmentId(id),
        PlanOperator::FanIn {
            inputs: sources
                .iter()
                .map(|&s| PlanOperator::remote(FragmentId(s), TransferMode::Partitioned))
                .collect(),
        },
    )
}

/// Join fragment with remote probe (left) and remote build (right), the
/// layout a planner produces for inner and left-outer joins.
fn join(id: u32, variant: JoinVariant, probe: u32, build: u32) -> PlanFragment {
    PlanFragment::new(
        FragmentId(id),
        PlanOperator::HashJoin {
            variant,
            distribution: JoinDistribution::Partitioned,
            left: Box::new(PlanOperator::remote(
                FragmentId(probe),
                TransferMode::Partitioned,
            )),
            right: Box::new(PlanOperator::remote(
                FragmentId(build),
                TransferMode::Partitioned,
            )),
        },
    )
}

/// Join fragment whose build side is a broadcast exchange and whose probe
/// side is a scan local to the join's own fragment.
fn broadcast_join(id: u32, build: u32) -> PlanFragment {
    PlanFragment::new(
        FragmentId(id),
        PlanOperator::HashJoin {
            variant: JoinVariant::Inner,
            distribution: JoinDistribution::BroadcastBuild,
            left: Box::new(PlanOperator::leaf()),
            right: Box::new(PlanOperator::remote(
                FragmentId(build),
                TransferMode::Broadcast,
            )),
        },
    )
}

fn phase(ids: &[u32]) -> Phase {
    Phase {
        fragments: ids.iter().map(|&id| FragmentId(id)).collect(),
    }
}

#[test]
fn exchange_fan_in_schedules_consumer_then_sources_in_order() {
    const A: u32 = 1;
    const B: u32 = 2;
    const C: u32 = 3;
    const X: u32 = 4;
    let fragments = vec![
        table_scan(A),
        table_scan(B),
        table_scan(C),
        exchange(X, &[A, B, C]),
    ];
    let phases = extract_phases(&fragments).expect("schedule succeeds");
    assert_eq!(
        phases,
        vec![phase(&[X]), phase(&[A]), phase(&[B]), phase(&[C])]
    );
}

#[test]
fn union_schedules_like_a_plain_exchange() {
    const A: u32 = 1;
    const B: u32 = 2;
    const C: u32 = 3;
    const U: u32 = 4;
    let fragments = vec![
        table_scan(A),
        table_scan(B),
        table_scan(C),
        union(U, &[A, B, C]),
    ];
    let phases = extract_phases(&fragments).expect("schedule succeeds");
    assert_eq!(
        phases,
        vec![phase(&[U]), phase(&[A]), phase(&[B]), phase(&[C])]
    );
}

#[test]
fn inner_join_schedules_join_then_build_then_probe() {
    const BUILD: u32 = 1;
    const PROBE: u32 = 2;
    const JOIN: u32 = 3;
    let fragments = vec![
        join(JOIN, JoinVariant::Inner, PROBE, BUILD),
        table_scan(BUILD),
        table_scan(PROBE),
    ];
    let phases = extract_phases(&fragments).expect("schedule succeeds");
    assert_eq!(
        phases,
        vec![phase(&[JOIN]), phase(&[BUILD]), phase(&[PROBE])]
    );
}

#[test]
fn right_join_with_swapped_inputs_matches_inner_result() {
    const BUILD: u32 = 1;
    const PROBE: u32 = 2;
    const JOIN: u32 = 3;
    // For a right-outer join the build side is the left input, so the
    // build fragment is wired on the left; externally the expected phase
    // order is the same as for the inner join.
    let fragments = vec![
        join(JOIN, JoinVariant::Right, BUILD, PROBE),
        table_scan(BUILD),
        table_scan(PROBE),
    ];
    let phases = extract_phases(&fragments).expect("schedule succeeds");
    assert_eq!(
        phases,
        vec![phase(&[JOIN]), phase(&[BUILD]), phase(&[PROBE])]
    );
}

#[test]
fn broadcast_build_join_merges_into_one_phase() {
    const BUILD: u32 = 1;
    const JOIN: u32 = 2;
    let fragments = vec![broadcast_join(JOIN, BUILD), table_scan(BUILD)];
    let phases = extract_phases(&fragments).expect("schedule succeeds");
    assert_eq!(phases, vec![phase(&[JOIN, BUILD])]);
}

#[test]
fn deep_join_exhausts_build_chain_before_probe_chain() {
    const JOIN: u32 = 1;
    const BUILD_TOP: u32 = 2;
    const BUILD_MIDDLE: u32 = 3;
    const BUILD_SOURCE: u32 = 4;
    const PROBE_TOP: u32 = 5;
    const PROBE_MIDDLE: u32 = 6;
    const PROBE_SOURCE: u32 = 7;
    let fragments = vec![
        join(JOIN, JoinVariant::Inner, PROBE_TOP, BUILD_TOP),
        exchange(BUILD_TOP, &[BUILD_MIDDLE]),
        exchange(BUILD_MIDDLE, &[BUILD_SOURCE]),
        table_scan(BUILD_SOURCE),
        exchange(PROBE_TOP, &[PROBE_MIDDLE]),
        exchange(PROBE_MIDDLE, &[PROBE_SOURCE]),
        table_scan(PROBE_SOURCE),
    ];
    let phases = extract_phases(&fragments).expect("schedule succeeds");
    assert_eq!(
        phases,
        vec![
            phase(&[JOIN]),
            phase(&[BUILD_TOP]),
            phase(&[BUILD_MIDDLE]),
            phase(&[BUILD_SOURCE]),
            phase(&[PROBE_TOP]),
            phase(&[PROBE_MIDDLE]),
            phase(&[PROBE_SOURCE]),
        ]
    );
}

#[test]
fn broadcast_chain_under_a_join_collapses_with_the_join() {
    const JOIN: u32 = 1;
    const BUILD: u32 = 2;
    const PROBE: u32 = 3;
    // Build side broadcast: join and build fragment co-schedule while the
    // probe fragment still lands in a later phase.
    let fragments = vec![
        PlanFragment::new(
            FragmentId(JOIN),
            PlanOperator::HashJoin {
                variant: JoinVariant::Inner,
                distribution: JoinDistribution::BroadcastBuild,
                left: Box::new(PlanOperator::remote(
                    FragmentId(PROBE),
                    TransferMode::Partitioned,
                )),
                right: Box::new(PlanOperator::remote(
                    FragmentId(BUILD),
                    TransferMode::Broadcast,
                )),
            },
        ),
        table_scan(BUILD),
        table_scan(PROBE),
    ];
    let phases = extract_phases(&fragments).expect("schedule succeeds");
    assert_eq!(phases, vec![phase(&[JOIN, BUILD]), phase(&[PROBE])]);
}

#[test]
fn dangling_reference_reports_both_fragments() {
    let fragments = vec![table_scan(1), exchange(2, &[9])];
    let err = extract_phases(&fragments).expect_err("must fail");
    assert_eq!(
        err,
        ScheduleError::UnknownFragment {
            referrer: FragmentId(2),
            referenced: FragmentId(9),
        }
    );
}

#[test]
fn empty_plan_is_rejected() {
    assert_eq!(
        extract_phases(&[]).expect_err("must fail"),
        ScheduleError::EmptyPlan
    );
}

#[test]
fn repeated_extraction_is_byte_identical() {
    let fragments = vec![
        join(1, JoinVariant::Inner, 5, 2),
        exchange(2, &[3]),
        broadcast_join(3, 4),
        table_scan(4),
        exchange(5, &[6]),
        table_scan(6),
    ];
    let first = extract_phases(&fragments).expect("schedule succeeds");
    let second = extract_phases(&fragments).expect("schedule succeeds");
    let first_json = serde_json::to_string(&first).expect("serialize");
    let second_json = serde_json::to_string(&second).expect("serialize");
    assert_eq!(first_json, second_json);
}

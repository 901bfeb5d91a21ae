//! End-to-end checks of the capacity engine against pool snapshots.

use pvs_capacity::{
    plan_capacity, validate_capacity_with_pools, CapacityError, MachineShape, PoolLedger,
    ResourcePool, Role, WorkerSet,
};
use rstest::rstest;

fn control_plane(system_type: &str, policy: &str, processors: i64, memory_gib: i64) -> Vec<MachineShape> {
    vec![MachineShape::new(system_type, policy, processors, memory_gib); 3]
}

fn workers(system_type: &str, policy: &str, processors: &str, memory_gib: i64, replicas: u32) -> Vec<WorkerSet> {
    vec![WorkerSet::new(
        "worker",
        replicas,
        MachineShape::new(system_type, policy, processors, memory_gib),
    )]
}

#[test]
fn test_control_plane_fits_single_pool() {
    let mut ledger = PoolLedger::new(vec![ResourcePool::new("e980", 10.0, 64)]);

    validate_capacity_with_pools(&control_plane("e980", "Dedicated", 2, 16), &[], &mut ledger)
        .unwrap();

    assert_eq!(ledger.pools(), &[ResourcePool::new("e980", 4.0, 16)]);
}

#[test]
fn test_control_plane_short_on_cores() {
    let mut ledger = PoolLedger::new(vec![ResourcePool::new("e980", 5.0, 64)]);

    let err = validate_capacity_with_pools(&control_plane("e980", "Dedicated", 2, 16), &[], &mut ledger)
        .unwrap_err();

    assert_eq!(
        err,
        CapacityError::InsufficientCores {
            role: Role::ControlPlane,
            pool: "e980".to_string(),
            pool_type: "e980".to_string(),
            needed: 6.0,
            available: 5.0,
        }
    );
    assert_eq!(ledger.pools()[0].available_memory_gib, 64);
}

#[test]
fn test_string_processors_for_workers() {
    let snapshot = vec![ResourcePool::new("s922", 12.0, 256)];
    let plan = plan_capacity(&[], &workers("s922", "Dedicated", "2.5", 32, 4), &snapshot).unwrap();

    assert_eq!(plan.worker.total_processors, 10.0);
    assert_eq!(plan.pools[0].available_cores, 2.0);
    assert_eq!(plan.pools[0].available_memory_gib, 128);
}

#[rstest]
#[case(1_000)]
#[case(1_000_000)]
fn test_shared_never_fails_on_cores(#[case] processors_per_node: i64) {
    let mut ledger = PoolLedger::new(vec![ResourcePool::new("e980", 0.0, 64)]);

    validate_capacity_with_pools(
        &control_plane("e980", "Shared", processors_per_node, 16),
        &[],
        &mut ledger,
    )
    .unwrap();

    assert_eq!(ledger.pools()[0].available_cores, 0.0);
    assert_eq!(ledger.pools()[0].available_memory_gib, 16);
}

#[test]
fn test_shared_still_checks_memory() {
    let mut ledger = PoolLedger::new(vec![ResourcePool::new("e980", 0.0, 32)]);

    let err = validate_capacity_with_pools(&control_plane("e980", "Shared", 4, 16), &[], &mut ledger)
        .unwrap_err();

    assert!(matches!(
        err,
        CapacityError::InsufficientMemory { needed: 48, available: 32, .. }
    ));
}

#[test]
fn test_unknown_policy_leaves_snapshot_intact() {
    let snapshot = vec![
        ResourcePool::named("a", "e980", 10.0, 64),
        ResourcePool::named("b", "s922", 10.0, 64),
    ];
    let mut ledger = PoolLedger::new(snapshot.clone());

    let err = validate_capacity_with_pools(
        &control_plane("e980", "Dedicated", 1, 8),
        &workers("s922", "Uncapped", "1", 8, 2),
        &mut ledger,
    )
    .unwrap_err();

    assert!(matches!(err, CapacityError::UnknownProcessorPolicy { role: Role::Worker, .. }));
    assert_eq!(ledger.into_pools(), snapshot);
}

#[test]
fn test_malformed_processor_count_leaves_snapshot_intact() {
    let snapshot = vec![ResourcePool::new("s922", 10.0, 64)];
    let mut ledger = PoolLedger::new(snapshot.clone());

    let err = validate_capacity_with_pools(&[], &workers("s922", "Dedicated", "2,5", 8, 2), &mut ledger)
        .unwrap_err();

    assert_eq!(
        err,
        CapacityError::MalformedProcessorCount {
            role: Role::Worker,
            index: 0,
            value: "2,5".to_string(),
        }
    );
    assert_eq!(ledger.into_pools(), snapshot);
}

#[test]
fn test_empty_roles_never_fail() {
    let snapshot = vec![ResourcePool::new("e980", -4.0, -16)];
    let mut ledger = PoolLedger::new(snapshot.clone());

    validate_capacity_with_pools(&[], &[], &mut ledger).unwrap();

    assert_eq!(ledger.into_pools(), snapshot);
}

#[test]
fn test_roles_on_different_system_types() {
    let mut ledger = PoolLedger::new(vec![
        ResourcePool::named("cp", "e980", 6.0, 48),
        ResourcePool::named("wk", "s922", 10.0, 128),
    ]);

    validate_capacity_with_pools(
        &control_plane("e980", "Dedicated", 2, 16),
        &workers("s922", "Dedicated", "2.5", 32, 4),
        &mut ledger,
    )
    .unwrap();

    assert_eq!(ledger.pools()[0], ResourcePool::named("cp", "e980", 0.0, 0));
    assert_eq!(ledger.pools()[1], ResourcePool::named("wk", "s922", 0.0, 0));
}

#[test]
fn test_both_roles_share_one_pool() {
    let mut ledger = PoolLedger::new(vec![ResourcePool::new("e980", 10.0, 100)]);

    let err = validate_capacity_with_pools(
        &control_plane("e980", "Dedicated", 2, 16),
        &workers("e980", "Dedicated", "2", 16, 3),
        &mut ledger,
    )
    .unwrap_err();

    // The control plane took 6 of 10 cores before the workers asked for 6.
    assert_eq!(
        err,
        CapacityError::InsufficientCores {
            role: Role::Worker,
            pool: "e980".to_string(),
            pool_type: "e980".to_string(),
            needed: 6.0,
            available: 4.0,
        }
    );
    assert_eq!(ledger.pools()[0].available_memory_gib, 52);
}

/// Demand is not spread across pools of the same type: every matching pool
/// must hold the role's entire demand. Changing this is a deliberate
/// behaviour change.
#[test]
fn test_demand_is_not_spread_across_same_type_pools() {
    let snapshot = vec![
        ResourcePool::named("pool-1", "e980", 4.0, 64),
        ResourcePool::named("pool-2", "e980", 4.0, 64),
    ];

    // 8 cores of combined headroom, but no single pool has 6.
    let err = plan_capacity(&control_plane("e980", "Dedicated", 2, 16), &[], &snapshot).unwrap_err();
    assert!(matches!(
        err,
        CapacityError::InsufficientCores { ref pool, needed, .. } if pool == "pool-1" && needed == 6.0
    ));

    // When each pool can hold the whole demand, each one is debited in full.
    let snapshot = vec![
        ResourcePool::named("pool-1", "e980", 6.0, 64),
        ResourcePool::named("pool-2", "e980", 8.0, 64),
    ];
    let plan = plan_capacity(&control_plane("e980", "Dedicated", 2, 16), &[], &snapshot).unwrap();
    assert_eq!(plan.pools[0].available_cores, 0.0);
    assert_eq!(plan.pools[1].available_cores, 2.0);
    assert_eq!(plan.pools[0].available_memory_gib, 16);
    assert_eq!(plan.pools[1].available_memory_gib, 16);
}

#[test]
fn test_failure_keeps_earlier_debits() {
    let mut ledger = PoolLedger::new(vec![
        ResourcePool::named("first", "e980", 10.0, 64),
        ResourcePool::named("second", "e980", 10.0, 32),
        ResourcePool::named("third", "e980", 10.0, 64),
    ]);

    let err = validate_capacity_with_pools(&control_plane("e980", "Dedicated", 2, 16), &[], &mut ledger)
        .unwrap_err();

    assert!(matches!(err, CapacityError::InsufficientMemory { ref pool, .. } if pool == "second"));
    let pools = ledger.into_pools();
    assert_eq!(pools[0], ResourcePool::named("first", "e980", 4.0, 16));
    assert_eq!(pools[1], ResourcePool::named("second", "e980", 4.0, 32));
    assert_eq!(pools[2], ResourcePool::named("third", "e980", 10.0, 64));
}

#[test]
fn test_plan_from_toml() {
    #[derive(serde::Deserialize)]
    struct Plan {
        control_plane: Vec<MachineShape>,
        workers: Vec<WorkerSet>,
    }

    let plan: Plan = toml::from_str(
        r#"
        [[control_plane]]
        system_type = "e980"
        processor_type = "Dedicated"
        processors = 2
        memory_gib = 16

        [[workers]]
        name = "worker"
        replicas = 4

        [workers.template]
        system_type = "e980"
        processor_type = "Shared"
        processors = "0.5"
        memory_gib = 8
        "#,
    )
    .unwrap();

    let snapshot = vec![ResourcePool::new("e980", 2.0, 64)];
    let result = plan_capacity(&plan.control_plane, &plan.workers, &snapshot).unwrap();
    assert_eq!(result.pools[0], ResourcePool::new("e980", 0.0, 16));
}

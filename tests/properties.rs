#[cfg(test)]
mod tests {
    use dopamine_engine::*;
    use proptest::prelude::*;

    fn arb_kind() -> impl Strategy<Value = ContributionType> {
        prop_oneof![Just(ContributionType::Money), Just(ContributionType::Time)]
    }

    /// (goal index, kind, amount, is_withdrawal)
    fn arb_ops() -> impl Strategy<Value = Vec<(usize, ContributionType, u32, bool)>> {
        prop::collection::vec((0usize..4, arb_kind(), 1u32..500, any::<bool>()), 0..60)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_resolve_inverts_target(
            count in 1usize..=64,
            extent in 0.5f64..720.0,
            revolutions in 0u32..=50,
            seed_index in any::<usize>(),
        ) {
            let index = seed_index % count;
            let travel = target_position(index, revolutions, extent, count);
            prop_assert_eq!(resolve_index(travel, extent, count).unwrap(), index);
        }

        #[test]
        fn prop_reconciler_inverts_through_rendering(
            count in 1usize..=64,
            extent in 0.5f64..720.0,
            revolutions in 1u32..=20,
            seed_index in any::<usize>(),
            reverse in any::<bool>(),
        ) {
            let index = seed_index % count;
            let mut config = SpinConfig::amount_spinner(count);
            config.item_extent = extent;
            config.direction = if reverse { SpinDirection::Reverse } else { SpinDirection::Forward };
            let reconciler = OutcomeReconciler::new(&config);
            let rendered = reconciler.rendered(reconciler.target(index, revolutions));
            prop_assert_eq!(reconciler.resolve(rendered).unwrap(), index);
        }

        #[test]
        fn prop_log_values_bounded_and_increasing(
            min in 1u32..10_000,
            span in 1u32..100_000,
            count in 2usize..80,
        ) {
            let max = min + span;
            let values = generate_log_values(min, max, count).unwrap();
            prop_assert_eq!(values.first().copied(), Some(min));
            prop_assert_eq!(values.last().copied(), Some(max));
            prop_assert!(values.len() <= count);
            prop_assert!(values.windows(2).all(|w| w[0] < w[1]), "not increasing: {:?}", values);
        }

        #[test]
        fn prop_easing_stays_in_unit_interval(t in -2.0f64..3.0) {
            for easing in [
                Easing::Linear,
                Easing::EaseInQuad,
                Easing::EaseInCubic,
                Easing::EaseOutQuad,
                Easing::EaseOutCubic,
                Easing::CircOut,
            ] {
                let y = easing.apply(t);
                prop_assert!((0.0..=1.0).contains(&y), "{:?}({}) = {}", easing, t, y);
            }
        }

        #[test]
        fn prop_ledger_additive_and_never_overdrawn(ops in arb_ops()) {
            let goals = ["books", "travel", "stocks", "savings"];
            let ledger = ContributionLedger::new(MemoryStore::new(), ManualClock::new(0));
            for (goal, kind, amount, withdraw) in ops {
                let id = goals[goal];
                if withdraw {
                    let before = ledger.net_contribution(id, kind);
                    let result = ledger.withdraw(id, id, kind, amount);
                    prop_assert_eq!(result.is_ok(), amount as i64 <= before);
                } else {
                    ledger.append(NewContribution::deposit(id, id, kind, amount)).unwrap();
                }
            }

            let stats = ledger.stats();
            for kind in ContributionType::ALL {
                let by_goal: i64 = stats.goals.iter().map(|g| g.net(kind)).sum();
                prop_assert_eq!(by_goal, ledger.total_by_type(kind));
                for goal in &stats.goals {
                    prop_assert!(goal.net(kind) >= 0);
                }
            }

            for goal in goals {
                ledger.reset_goal(goal, goal).unwrap();
            }
            prop_assert_eq!(ledger.total_by_type(ContributionType::Money), 0);
            prop_assert_eq!(ledger.total_by_type(ContributionType::Time), 0);
        }
    }
}

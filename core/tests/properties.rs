//! Property tests over the economy invariants.

use clicker_core::{
    config::GameConfig,
    engine::GameEngine,
    snapshot,
    upgrade::next_cost,
};
use proptest::prelude::*;

fn engine() -> GameEngine {
    GameEngine::build_test("props".into(), 13).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_purchase_applies_cost_growth(coins in 0.0f64..100_000.0, index in 0usize..3) {
        let mut e = engine();
        e.add_coins(coins);
        let before = e.progress().click_upgrades[index].clone();

        let bought = e.purchase_click_upgrade(index);
        let after = &e.progress().click_upgrades[index];

        prop_assert_eq!(bought, coins >= before.cost);
        if bought {
            prop_assert_eq!(after.level, before.level + 1);
            prop_assert_eq!(after.cost, next_cost(before.cost, before.cost_multiplier));
            prop_assert!((after.effect - before.effect * before.effect_multiplier).abs() < 1e-9);
            prop_assert!((e.progress().coins - (coins - before.cost)).abs() < 1e-9);
        } else {
            prop_assert_eq!(after, &before);
            prop_assert_eq!(e.progress().coins, coins);
        }
    }

    #[test]
    fn prop_coins_never_negative(start in 0.0f64..1_000.0, take in 0.0f64..2_000.0) {
        let mut e = engine();
        e.add_coins(start);
        e.remove_coins(take);
        prop_assert!(e.progress().coins >= 0.0);
        prop_assert!((e.progress().coins - (start - take).max(0.0)).abs() < 1e-9);
    }

    #[test]
    fn prop_use_energy_is_all_or_nothing(energy in 0.0f64..100.0, cost in 0.0f64..150.0) {
        let mut e = engine();
        e.progress_mut_for_test().energy = energy;

        let spent = e.use_energy(cost);
        prop_assert_eq!(spent, energy >= cost);
        let expected = if spent { energy - cost } else { energy };
        prop_assert_eq!(e.progress().energy, expected);
    }

    #[test]
    fn prop_energy_stays_within_max(
        energy in 0.0f64..100.0,
        regen in 0.0f64..50.0,
        ticks in 0u64..200,
    ) {
        let mut e = engine();
        {
            let p = e.progress_mut_for_test();
            p.energy = energy;
            p.energy_regen_rate = regen;
        }
        e.run_ticks(ticks);
        prop_assert!(e.progress().energy <= e.progress().max_energy);
        prop_assert!(e.progress().energy >= energy);
    }

    #[test]
    fn prop_snapshot_round_trips(
        coins in 0.0f64..1e9,
        clicks in 0u64..1_000_000,
        buys in proptest::collection::vec(0usize..8, 0..12),
    ) {
        let mut e = engine();
        e.add_coins(1e9);
        for i in buys {
            if i < 3 {
                e.purchase_click_upgrade(i);
            } else {
                e.purchase_passive_upgrade(i - 3);
            }
        }
        {
            let p = e.progress_mut_for_test();
            p.coins = coins;
            p.total_clicks = clicks;
        }

        let json = snapshot::encode(e.progress()).unwrap();
        let restored = snapshot::decode(&json, &GameConfig::default_test(), 0).unwrap();
        prop_assert_eq!(&restored, e.progress());
    }
}

use holdem_engine::pot::{Contribution, PotManager};

#[test]
fn heads_up_simple_side_pot() {
    let pm = PotManager::from_contributions([500, 1000]);
    assert_eq!(pm.main_pot(), 1000);
    assert_eq!(pm.side_pots(), vec![500]);
}

#[test]
fn equal_stacks_no_side_pot() {
    let pm = PotManager::from_contributions([1000, 1000]);
    assert_eq!(pm.main_pot(), 2000);
    assert!(pm.side_pots().is_empty());
}

#[test]
fn three_way_layers_with_two_all_ins() {
    let pm = PotManager::from_contributions([100, 300, 1000]);
    assert_eq!(pm.main_pot(), 300);
    assert_eq!(pm.side_pots(), vec![400, 700]);
    assert_eq!(pm.pots()[2].eligible, vec![2]);
}

#[test]
fn uncalled_excess_returns_to_its_owner() {
    let pm = PotManager::from_contributions([400, 1000]);
    let awards = pm.distribute(&[0, 1], |_| vec![0]);
    // seat 0 wins the matched 800, the unmatched 600 can only go to seat 1
    assert_eq!(awards, vec![(0, 800), (1, 600)]);
}

#[test]
fn folded_chips_stay_in_the_pot() {
    let pm = PotManager::new(&[
        Contribution {
            seat: 0,
            amount: 40,
            folded: true,
        },
        Contribution {
            seat: 1,
            amount: 200,
            folded: false,
        },
        Contribution {
            seat: 2,
            amount: 200,
            folded: false,
        },
    ]);
    assert_eq!(pm.total(), 440);
    assert_eq!(pm.pots().len(), 1);
    assert_eq!(pm.pots()[0].eligible, vec![1, 2]);
}

#[test]
fn empty_winner_list_splits_among_eligible() {
    let pm = PotManager::from_contributions([50, 50]);
    let awards = pm.distribute(&[1, 0], |_| Vec::new());
    assert_eq!(awards, vec![(1, 50), (0, 50)]);
}

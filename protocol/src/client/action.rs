/// A decision for one request, in the form the server's `/choose` expects.
///
/// Slots are 1-based, matching the order of the request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleAction {
    Move {
        slot: usize,
        /// Target position for doubles: positive for foes, negative for allies
        target: Option<i8>,
        mega: bool,
        terastallize: bool,
    },
    Switch {
        slot: usize,
    },
    /// Team preview lead order
    Team {
        order: Vec<usize>,
    },
}

impl BattleAction {
    pub fn move_slot(slot: usize) -> Self {
        BattleAction::Move {
            slot,
            target: None,
            mega: false,
            terastallize: false,
        }
    }

    pub fn switch(slot: usize) -> Self {
        BattleAction::Switch { slot }
    }

    /// Choice text without the `/choose` prefix, e.g. `move 2 terastallize`
    pub fn to_choice(&self) -> String {
        match self {
            BattleAction::Move {
                slot,
                target,
                mega,
                terastallize,
            } => {
                let mut choice = format!("move {}", slot);
                if let Some(target) = target {
                    choice.push_str(&format!(" {:+}", target));
                }
                if *mega {
                    choice.push_str(" mega");
                }
                if *terastallize {
                    choice.push_str(" terastallize");
                }
                choice
            }
            BattleAction::Switch { slot } => format!("switch {}", slot),
            BattleAction::Team { order } => {
                let order: String = order.iter().map(|slot| slot.to_string()).collect();
                format!("team {}", order)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_choice() {
        assert_eq!(BattleAction::move_slot(1).to_choice(), "move 1");

        let action = BattleAction::Move {
            slot: 2,
            target: Some(-1),
            mega: true,
            terastallize: true,
        };
        assert_eq!(action.to_choice(), "move 2 -1 mega terastallize");

        let targeted = BattleAction::Move {
            slot: 4,
            target: Some(2),
            mega: false,
            terastallize: false,
        };
        assert_eq!(targeted.to_choice(), "move 4 +2");
    }

    #[test]
    fn test_switch_and_team_choice() {
        assert_eq!(BattleAction::switch(5).to_choice(), "switch 5");
        assert_eq!(
            BattleAction::Team {
                order: vec![3, 1, 2, 4, 5, 6]
            }
            .to_choice(),
            "team 312456"
        );
    }
}

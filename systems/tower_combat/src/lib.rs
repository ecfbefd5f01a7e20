#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits tower firing commands from targeting data.

use shape_defence_core::{
    Command, EnemyId, TowerCooldownSnapshot, TowerCooldownView, TowerId, TowerTarget,
};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<(TowerId, Vec<EnemyId>)>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits one `Command::FireTower` per ready tower that has targets.
    ///
    /// Targets belonging to the same tower are grouped in the order they were
    /// assigned. Towers still cooling down, or unknown to the cooldown view,
    /// stay silent.
    pub fn handle(
        &mut self,
        tower_cooldowns: TowerCooldownView,
        tower_targets: &[TowerTarget],
        out: &mut Vec<Command>,
    ) {
        if tower_targets.is_empty() {
            return;
        }

        let cooldowns = tower_cooldowns.into_vec();
        if cooldowns.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            let ready = find_cooldown(&cooldowns, target.tower)
                .is_some_and(|snapshot| snapshot.ready_in.is_zero());
            if !ready {
                continue;
            }

            match self.scratch.last_mut() {
                Some((tower, enemies)) if *tower == target.tower => enemies.push(target.enemy),
                _ => self.scratch.push((target.tower, vec![target.enemy])),
            }
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.extend(
            self.scratch
                .drain(..)
                .map(|(tower, targets)| Command::FireTower { tower, targets }),
        );
    }
}

fn find_cooldown(
    cooldowns: &[TowerCooldownSnapshot],
    tower: TowerId,
) -> Option<&TowerCooldownSnapshot> {
    cooldowns
        .binary_search_by_key(&tower, |snapshot| snapshot.tower)
        .ok()
        .map(|index| &cooldowns[index])
}

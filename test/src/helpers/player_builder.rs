use propnet_shared::EntityHandle;

use crate::test_protocol::{BaseEntity, Player, Weapon};

/// Fluent builder for test players
pub struct PlayerBuilder {
    player: Player,
}

impl PlayerBuilder {
    pub fn new() -> Self {
        Self {
            player: Player {
                base: BaseEntity {
                    health: 100,
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    pub fn origin(mut self, x: f32, y: f32, z: f32) -> Self {
        self.player.base.origin = [x, y, z];
        self
    }

    pub fn eye_yaw(mut self, degrees: f32) -> Self {
        self.player.eye_yaw = degrees;
        self
    }

    pub fn health(mut self, health: i64) -> Self {
        self.player.base.health = health;
        self
    }

    pub fn owner(mut self, owner: EntityHandle) -> Self {
        self.player.base.owner = Some(owner);
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.player.name = name.to_string();
        self
    }

    pub fn weapon(mut self, ammo: i64, heat: f32) -> Self {
        self.player.weapon = Weapon { ammo, heat };
        self
    }

    pub fn build(self) -> Player {
        self.player
    }
}

impl Default for PlayerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

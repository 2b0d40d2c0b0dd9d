/// Shared test protocol: a `Player` extending `BaseEntity` with a nested
/// `Weapon`, and overriding the inherited `health` with a signed range.
use std::sync::Arc;

use propnet_shared::{EntityHandle, Lens, PropertyDescriptor, PropertyTable, Protocol};

pub const ORIGIN_BITS: u8 = 12;
pub const ORIGIN_LOW: f32 = 0.0;
pub const ORIGIN_HIGH: f32 = 8192.0;
pub const EYE_YAW_BITS: u8 = 11;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BaseEntity {
    pub origin: [f32; 3],
    pub health: i64,
    pub owner: Option<EntityHandle>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Weapon {
    pub ammo: i64,
    pub heat: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Player {
    pub base: BaseEntity,
    pub eye_yaw: f32,
    pub name: String,
    pub weapon: Weapon,
}

pub fn base_entity_table() -> PropertyTable {
    PropertyTable::new("BaseEntity")
        .add(
            PropertyDescriptor::vector("origin", ORIGIN_BITS, ORIGIN_LOW, ORIGIN_HIGH)
                .bind::<BaseEntity, [f32; 3]>(
                    |entity| entity.origin,
                    |entity, value| entity.origin = value,
                ),
        )
        .add(PropertyDescriptor::int("health", 8).bind::<BaseEntity, i64>(
            |entity| entity.health,
            |entity, value| entity.health = value,
        ))
        .add(
            PropertyDescriptor::entity_handle("owner").bind::<BaseEntity, Option<EntityHandle>>(
                |entity| entity.owner,
                |entity, value| entity.owner = value,
            ),
        )
}

pub fn weapon_table() -> PropertyTable {
    PropertyTable::new("Weapon")
        .add(PropertyDescriptor::int("ammo", 6).bind::<Weapon, i64>(
            |weapon| weapon.ammo,
            |weapon, value| weapon.ammo = value,
        ))
        .add(
            PropertyDescriptor::float("heat", 8, 0.0, 1.0)
                .bind::<Weapon, f32>(|weapon| weapon.heat, |weapon, value| weapon.heat = value),
        )
}

pub fn player_table() -> PropertyTable {
    PropertyTable::new("Player")
        .extends_via(
            "BaseEntity",
            Lens::new::<Player, BaseEntity>(|player| &player.base, |player| &mut player.base),
        )
        .exclude("BaseEntity", "health")
        .add(
            PropertyDescriptor::int("health", 7)
                .with_range(-100, 100)
                .bind::<Player, i64>(
                    |player| player.base.health,
                    |player, value| player.base.health = value,
                ),
        )
        .add(
            PropertyDescriptor::angle("eyeYaw", EYE_YAW_BITS)
                .changes_often()
                .bind::<Player, f32>(|player| player.eye_yaw, |player, value| player.eye_yaw = value),
        )
        .add(PropertyDescriptor::string("name", 5).bind::<Player, String>(
            |player| player.name.clone(),
            |player, value| player.name = value,
        ))
        .add(PropertyDescriptor::nested(
            "weapon",
            "Weapon",
            Lens::new::<Player, Weapon>(|player| &player.weapon, |player| &mut player.weapon),
        ))
}

/// `BaseEntity` is class 0, `Player` class 1
pub fn protocol() -> Arc<Protocol> {
    let protocol = Protocol::builder()
        .add_class::<BaseEntity>(base_entity_table())
        .add_table(weapon_table())
        .add_class::<Player>(player_table())
        .build();
    match protocol {
        Ok(protocol) => Arc::new(protocol),
        Err(error) => panic!("test protocol failed to build: {}", error),
    }
}

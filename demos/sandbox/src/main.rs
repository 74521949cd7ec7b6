//! Sandbox host application.
//!
//! Plays the role of the external host-object collaborator: runs the
//! registration window, builds containers for a few demo hosts, drives the
//! tick and load lifecycle, persists component records, and ships dirty
//! state through the sync envelope the way a real transport would.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tether_container::{FactoryRegistry, run_registration};
use tether_sync::{HostUpdate, apply_host_update, collect_updates, decode, encode};
use vitality::{Creature, ItemStack, VitalityInit, age_key, vita_key};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Registration window: every extension registers its factories, then
    // the registries seal. After this point the component layout of every
    // container is fixed.
    let mut creature_factories = FactoryRegistry::<Creature>::new("creature");
    let mut item_factories = FactoryRegistry::<ItemStack>::new("item_stack");
    run_registration(&mut creature_factories, &[&VitalityInit])?;
    run_registration(&mut item_factories, &[&VitalityInit])?;

    let zombie = Creature {
        name: "zombie".into(),
        undead: true,
    };
    let mut zombie_components = creature_factories.build(&zombie)?;
    zombie_components.on_load();
    info!(host = %zombie.name, components = ?zombie_components, "creature loaded");

    // A second container for the same host stands in for the remote copy a
    // client would hold.
    let mut replica = creature_factories.build(&zombie)?;

    for _ in 0..100 {
        zombie_components.tick();
    }
    if let Some(vita) = zombie_components.get_mut(vita_key()) {
        vita.drain(15);
    }
    let age = zombie_components
        .get(age_key())
        .map_or(0, vitality::Age::ticks);
    info!(host = %zombie.name, age, "ticked");

    // Ship dirty state: container -> envelope -> bytes -> replica.
    let updates = collect_updates(&mut zombie_components)?;
    let envelope = HostUpdate {
        host: zombie.name.clone(),
        updates,
    };
    let wire = encode(&envelope)?;
    info!(bytes = wire.len(), "encoded sync envelope");
    let received: HostUpdate<String> = decode(&wire)?;
    apply_host_update(&mut replica, &received)?;
    info!(
        replica_vita = replica.get(vita_key()).map(vitality::Vita::amount),
        "replica caught up"
    );

    // Persist the zombie's components the way a save file would.
    let records = zombie_components.save()?;
    info!(records = records.len(), "saved component records");

    // Duplicate an item stack; copyable components carry their state over.
    let stick = ItemStack {
        item: "vitality_stick".into(),
        count: 1,
    };
    let mut stick_components = item_factories.build(&stick)?;
    if let Some(vita) = stick_components.get_mut(vita_key()) {
        vita.drain(3);
    }
    let mut duplicate = item_factories.build(&stick)?;
    stick_components.copy_into(&mut duplicate);
    info!(
        original = stick_components.get(vita_key()).map(vitality::Vita::amount),
        duplicate = duplicate.get(vita_key()).map(vitality::Vita::amount),
        "duplicated vitality stick"
    );

    zombie_components.on_unload();
    info!(host = %zombie.name, "creature unloaded");

    Ok(())
}

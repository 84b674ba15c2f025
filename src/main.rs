//! Multiworld Server
//!
//! Builds a small three-slot session and walks it through a few checks,
//! printing what each client would receive.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use multiworld::{
    build_store, decode, encode, render,
    hints::{
        ChannelSink, Hint, HintEngine, HintEvent, HintKind, LocationSetHint, LocationValue,
        SetKind, TextHint, TriggerableHint,
    },
    store::Placement,
    CheckTable, EngineConfig, GenerationData, ItemFlags, ItemId, LocationId, NameLookup, SlotId,
    TeamId, WireValue, PROTOCOL_VERSION, VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Multiworld Server v{} (protocol {})", VERSION, PROTOCOL_VERSION);
    info!("Store backend: {}, raw text: {}", config.store_backend, config.raw_text);

    let (sink, events) = ChannelSink::new();
    let transport = tokio::spawn(transport(events, config.raw_text));

    demo_session(&config, sink)?;

    let delivered = transport.await.context("transport task failed")?;
    info!("Transport delivered {} events", delivered);
    Ok(())
}

/// Slot and item names for the demo session.
struct DemoNames;

impl NameLookup for DemoNames {
    fn item_name(&self, item: ItemId, _owner: SlotId) -> String {
        match item.0 {
            500 => "Hookshot".to_string(),
            501 => "Bombs".to_string(),
            600 => "Ice Trap".to_string(),
            other => format!("Item {}", other),
        }
    }

    fn location_name(&self, location: LocationId, _owner: SlotId) -> String {
        format!("Chest {}", location.0)
    }

    fn player_name(&self, slot: SlotId) -> String {
        match slot.0 {
            1 => "Alice".to_string(),
            2 => "Bob".to_string(),
            3 => "Cleo".to_string(),
            other => format!("Player {}", other),
        }
    }
}

fn generation_data() -> GenerationData {
    let place = |item: i64, receiver: u32, flags: ItemFlags| {
        Placement::new(ItemId(item), SlotId(receiver), flags)
    };
    BTreeMap::from([
        (SlotId(1), BTreeMap::from([
            (LocationId(10), place(500, 2, ItemFlags::ADVANCEMENT)),
            (LocationId(11), place(501, 1, ItemFlags::USEFUL)),
        ])),
        (SlotId(2), BTreeMap::from([
            (LocationId(20), place(600, 3, ItemFlags::TRAP)),
            (LocationId(21), place(501, 2, ItemFlags::NONE)),
        ])),
        (SlotId(3), BTreeMap::from([
            (LocationId(100), place(500, 1, ItemFlags::ADVANCEMENT)),
            (LocationId(101), place(502, 3, ItemFlags::NONE)),
        ])),
    ])
}

fn demo_session(config: &EngineConfig, mut sink: ChannelSink) -> anyhow::Result<()> {
    let store = build_store(config.store_backend, generation_data())?;
    let team = TeamId(0);

    let region = LocationSetHint {
        player: SlotId(3),
        label: "Cleo's Cave".to_string(),
        set_kind: SetKind::RegionItems,
        total_value: 10,
        per_location_data: BTreeMap::from([
            (LocationId(100), LocationValue::new(7, serde_json::json!({"item": 500}))),
            (LocationId(101), LocationValue::new(3, serde_json::json!({"item": 502}))),
        ]),
    };

    let mut engine = HintEngine::new(vec![
        TriggerableHint::free(TextHint::new(SlotId(1), "The Hookshot is in someone's cave.")),
        TriggerableHint::free(region),
        TriggerableHint::on_location(
            TextHint::new(SlotId(2), "Bombs are never far from home."),
            SlotId(3),
            LocationId(100),
        ),
    ]);

    let mut checks = CheckTable::new();
    engine.ensure_team_init(team, &checks, &mut sink);

    // Cleo opens both cave chests in one burst.
    for location in [LocationId(100), LocationId(101)] {
        checks.record(team, SlotId(3), location);
    }
    engine.on_locations_checked(team, SlotId(3), &[LocationId(100), LocationId(101)], &checks, &mut sink);

    for slot in 1..=store.slot_count() as u32 {
        let slot = SlotId(slot);
        info!(
            "{}: checked {:?}, missing {:?}, remaining {:?}",
            DemoNames.player_name(slot),
            store.get_checked(&checks, team, slot),
            store.get_missing(&checks, team, slot),
            store.get_remaining(&checks, team, slot),
        );
    }

    let hookshot_holders: Vec<_> = store
        .find_item(&BTreeSet::from([SlotId(1), SlotId(2)]), ItemId(500))
        .map(|p| (p.finder, p.location))
        .collect();
    info!("Hookshots for Alice and Bob sit at {:?}", hookshot_holders);

    for set in engine.released_hints_for_kind(team, SlotId(3), HintKind::LocationSetHint, &checks, &mut sink) {
        info!("Cleo's set hint: {}", encode(&set.to_wire()));
    }

    let placement = store
        .placement(SlotId(1), LocationId(10))
        .context("demo location missing")?;
    let hint = Hint {
        receiving_player: placement.receiver,
        finding_player: SlotId(1),
        location: LocationId(10),
        item: placement.item,
        found: false,
        entrance: String::new(),
        item_flags: placement.flags,
    }
    .re_check(&checks, team);
    print_json(&hint.as_network_message(), config.raw_text)?;

    Ok(())
}

/// Encode, decode and render a `PrintJSON` message the way a client would.
fn print_json(message: &WireValue, raw: bool) -> anyhow::Result<()> {
    let text = encode(message);
    let echoed = decode(&text)?;
    let parts: Vec<multiworld::text::MessagePart> = match echoed.get("data") {
        Some(data) => serde_json::from_str(&encode(data))?,
        None => Vec::new(),
    };
    println!("{}", render(&parts, &DemoNames, raw)?);
    Ok(())
}

async fn transport(mut events: mpsc::UnboundedReceiver<HintEvent>, raw: bool) -> usize {
    let mut delivered = 0;
    while let Some(event) = events.recv().await {
        delivered += 1;
        match event {
            HintEvent::Changed { team, recipient, kind } => {
                info!("Team {}: refresh {} for {}", team, kind, DemoNames.player_name(recipient));
            }
            HintEvent::Messages { team, messages } => {
                for (slot, parts) in messages {
                    let message = WireValue::map([
                        ("cmd", WireValue::from("PrintJSON")),
                        ("data", WireValue::List(parts.iter().map(|p| p.to_wire()).collect())),
                    ]);
                    info!("Team {} -> slot {}: {}", team, slot, encode(&message));
                    match render(&parts, &DemoNames, raw) {
                        Ok(text) => println!("[{}] {}", DemoNames.player_name(slot), text),
                        Err(e) => warn!("Could not render message for slot {}: {}", slot, e),
                    }
                }
            }
        }
    }
    delivered
}

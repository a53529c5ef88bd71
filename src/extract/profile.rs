use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActionProfile {
    pub id: String,
    pub mean_cycles: f64,
    pub min_cycles: u64,
    pub max_cycles: u64,
    pub total_cycles: u64,
    pub firings: u64,
}

/// Scheduling-phase cycle counters of one actor's trigger process.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TriggerCounters {
    pub idle_state: u64,
    pub launch: u64,
    pub check: u64,
    pub sleep: u64,
    pub sync_launch: u64,
    pub sync_check: u64,
    pub sync_wait: u64,
    pub sync_exec: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ActorProfile {
    pub id: String,
    pub total_cycles: u64,
    pub firings: u64,
    pub actions: Vec<ActionProfile>,
    pub trigger: TriggerCounters,
}

/// Cycle accounting for one simulated network run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NetworkProfile {
    pub name: String,
    pub total_cycles: u64,
    pub trip_count: u64,
    pub actors: Vec<ActorProfile>,
}

/// Parses an exdf profile dump. Generated fanout actors carry no useful
/// stats, so any actor whose id contains "fanout" is dropped.
pub fn parse_str(xml: &str) -> Result<NetworkProfile> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut network: Option<NetworkProfile> = None;
    loop {
        match reader.read_event().context("read profile event")? {
            Event::Start(e) => match e.name().as_ref() {
                b"network" => network = Some(read_network(&e)?),
                b"actor" => {
                    let attrs = attr_map(&e)?;
                    let id = require_attr(&attrs, "id")?.to_string();
                    if id.contains("fanout") {
                        let end = e.to_end().into_owned();
                        reader.read_to_end(end.name()).context("skip fanout actor")?;
                        continue;
                    }
                    let actor = read_actor(&mut reader, &attrs, id)?;
                    network
                        .as_mut()
                        .ok_or_else(|| anyhow!("actor element outside a network"))?
                        .actors
                        .push(actor);
                }
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"network" => network = Some(read_network(&e)?),
                b"actor" => {
                    let attrs = attr_map(&e)?;
                    let id = require_attr(&attrs, "id")?.to_string();
                    if !id.contains("fanout") {
                        bail!("actor {id} has no trigger element");
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    network.ok_or_else(|| anyhow!("no network element in profile"))
}

pub fn parse_file(path: &Path) -> Result<NetworkProfile> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("read profile {}", path.display()))?;
    parse_str(&xml).with_context(|| format!("parse profile {}", path.display()))
}

fn read_network(e: &BytesStart) -> Result<NetworkProfile> {
    let attrs = attr_map(e)?;
    Ok(NetworkProfile {
        name: require_attr(&attrs, "name")?.to_string(),
        total_cycles: numeric_attr(&attrs, "clockcycles-total")?,
        trip_count: numeric_attr(&attrs, "runs")?,
        actors: Vec::new(),
    })
}

fn read_actor(
    reader: &mut Reader<&[u8]>,
    attrs: &HashMap<String, String>,
    id: String,
) -> Result<ActorProfile> {
    let total_cycles = numeric_attr(attrs, "clockcycles-total")?;
    let firings = numeric_attr(attrs, "firings")?;
    let mut actions = Vec::new();
    let mut trigger = None;
    loop {
        match reader.read_event().context("read profile event")? {
            Event::Empty(e) => match e.name().as_ref() {
                b"action" => actions.push(read_action(&e)?),
                b"trigger" => trigger = Some(read_trigger(&e)?),
                _ => {}
            },
            Event::Start(e) => {
                let end = e.to_end().into_owned();
                match e.name().as_ref() {
                    b"action" => actions.push(read_action(&e)?),
                    b"trigger" => trigger = Some(read_trigger(&e)?),
                    _ => {}
                }
                reader.read_to_end(end.name()).context("skip nested element")?;
            }
            Event::End(_) => break,
            Event::Eof => bail!("unexpected end of file inside actor {id}"),
            _ => {}
        }
    }
    let trigger = trigger.ok_or_else(|| anyhow!("actor {id} has no trigger element"))?;
    Ok(ActorProfile {
        id,
        total_cycles,
        firings,
        actions,
        trigger,
    })
}

fn read_action(e: &BytesStart) -> Result<ActionProfile> {
    let attrs = attr_map(e)?;
    Ok(ActionProfile {
        id: require_attr(&attrs, "id")?.to_string(),
        mean_cycles: numeric_attr(&attrs, "clockcycles")?,
        min_cycles: numeric_attr(&attrs, "clockcycles-min")?,
        max_cycles: numeric_attr(&attrs, "clockcycles-max")?,
        total_cycles: numeric_attr(&attrs, "clockcycles-total")?,
        firings: numeric_attr(&attrs, "firings")?,
    })
}

fn read_trigger(e: &BytesStart) -> Result<TriggerCounters> {
    let attrs = attr_map(e)?;
    Ok(TriggerCounters {
        idle_state: numeric_attr(&attrs, "IDLE_STATE")?,
        launch: numeric_attr(&attrs, "LAUNCH")?,
        check: numeric_attr(&attrs, "CHECK")?,
        sleep: numeric_attr(&attrs, "SLEEP")?,
        sync_launch: numeric_attr(&attrs, "SYNC_LAUNCH")?,
        sync_check: numeric_attr(&attrs, "SYNC_CHECK")?,
        sync_wait: numeric_attr(&attrs, "SYNC_WAIT")?,
        sync_exec: numeric_attr(&attrs, "SYNC_EXEC")?,
    })
}

fn attr_map(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.context("read attribute")?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().context("decode attribute value")?;
        out.insert(key, value.into_owned());
    }
    Ok(out)
}

fn require_attr<'a>(attrs: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    attrs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing attribute {key:?}"))
}

fn numeric_attr<T>(attrs: &HashMap<String, String>, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    require_attr(attrs, key)?
        .parse()
        .with_context(|| format!("attribute {key:?} is not numeric"))
}

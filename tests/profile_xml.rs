use synth_herder::extract::profile::parse_str;

const EXDF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<network name="decoderDemo" clockcycles-total="1234567" runs="100">
  <actor id="parser" clockcycles-total="23456" firings="420">
    <action id="parse_header" clockcycles="12.5" clockcycles-min="3" clockcycles-max="99" clockcycles-total="5250" firings="420"/>
    <trigger IDLE_STATE="10" LAUNCH="20" CHECK="30" SLEEP="40" SYNC_LAUNCH="50" SYNC_CHECK="60" SYNC_WAIT="70" SYNC_EXEC="80"/>
  </actor>
  <actor id="fanout_parser_out" clockcycles-total="11" firings="1">
    <trigger IDLE_STATE="0" LAUNCH="0" CHECK="0" SLEEP="0" SYNC_LAUNCH="0" SYNC_CHECK="0" SYNC_WAIT="0" SYNC_EXEC="0"/>
  </actor>
  <actor id="texture_decoder" clockcycles-total="99000" firings="77">
    <action id="decode" clockcycles="128.25" clockcycles-min="64" clockcycles-max="512" clockcycles-total="9876" firings="77"/>
    <action id="flush" clockcycles="4.0" clockcycles-min="2" clockcycles-max="8" clockcycles-total="308" firings="77"/>
    <trigger IDLE_STATE="1" LAUNCH="2" CHECK="3" SLEEP="4" SYNC_LAUNCH="5" SYNC_CHECK="6" SYNC_WAIT="7" SYNC_EXEC="8"/>
  </actor>
</network>
"#;

#[test]
fn parses_network_and_actor_stats() {
    let profile = parse_str(EXDF).unwrap();

    assert_eq!(profile.name, "decoderDemo");
    assert_eq!(profile.total_cycles, 1234567);
    assert_eq!(profile.trip_count, 100);
    assert_eq!(profile.actors.len(), 2);

    let parser = &profile.actors[0];
    assert_eq!(parser.id, "parser");
    assert_eq!(parser.total_cycles, 23456);
    assert_eq!(parser.firings, 420);
    assert_eq!(parser.actions.len(), 1);
    assert_eq!(parser.trigger.sleep, 40);
    assert_eq!(parser.trigger.sync_exec, 80);
}

#[test]
fn actors_with_fanout_ids_are_excluded() {
    let profile = parse_str(EXDF).unwrap();
    let ids: Vec<&str> = profile.actors.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["parser", "texture_decoder"]);
}

#[test]
fn action_min_and_max_follow_their_attributes() {
    let profile = parse_str(EXDF).unwrap();
    let decode = &profile.actors[1].actions[0];

    assert_eq!(decode.id, "decode");
    assert!((decode.mean_cycles - 128.25).abs() < 1e-9);
    assert_eq!(decode.min_cycles, 64);
    assert_eq!(decode.max_cycles, 512);
    assert_eq!(decode.total_cycles, 9876);
    assert_eq!(decode.firings, 77);
    assert!(decode.min_cycles <= decode.max_cycles);
}

#[test]
fn trigger_counters_serialize_with_screaming_keys() {
    let profile = parse_str(EXDF).unwrap();
    let json = serde_json::to_value(&profile.actors[1].trigger).unwrap();

    assert_eq!(json["IDLE_STATE"], 1);
    assert_eq!(json["SYNC_EXEC"], 8);
    assert_eq!(json.as_object().unwrap().len(), 8);
}

#[test]
fn actor_without_trigger_is_rejected() {
    let xml = r#"<network name="n" clockcycles-total="1" runs="1">
  <actor id="lonely" clockcycles-total="1" firings="1"/>
</network>"#;
    let err = parse_str(xml).unwrap_err();
    assert!(format!("{err:#}").contains("trigger"));
}

#[test]
fn actor_missing_a_counter_is_rejected() {
    let xml = r#"<network name="n" clockcycles-total="1" runs="1">
  <actor id="a" clockcycles-total="1" firings="1">
    <trigger IDLE_STATE="0" LAUNCH="0" CHECK="0" SLEEP="0" SYNC_LAUNCH="0" SYNC_CHECK="0" SYNC_WAIT="0"/>
  </actor>
</network>"#;
    let err = parse_str(xml).unwrap_err();
    assert!(format!("{err:#}").contains("SYNC_EXEC"));
}

#[test]
fn profile_without_network_element_is_rejected() {
    assert!(parse_str("<other/>").is_err());
}

use abom::{Abom, AbomConfig, Encode, Result};

#[test]
fn empty_container_contains_nothing_and_round_trips() -> Result<()> {
    let config = AbomConfig::tuned();
    let abom = Abom::new(config);

    assert!(!abom.contains("d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a"));
    assert_eq!(0, abom.len());

    let bytes = abom.encode_into_vec();
    let reloaded = abom::load(&bytes[..], config, true)?;

    assert_eq!(0, reloaded.len());
    assert!(!reloaded.contains("d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a"));

    Ok(())
}

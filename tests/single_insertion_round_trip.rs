use abom::{Abom, AbomConfig, Encode, Result};

#[test]
fn single_insertion_survives_serialization() -> Result<()> {
    let config = AbomConfig::tuned();
    let mut abom = Abom::new(config);
    let key = "d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a";

    abom.insert(key)?;
    assert!(abom.contains(key));

    let bytes = abom.encode_into_vec();
    let reloaded = abom::load(&bytes[..], config, true)?;

    assert!(reloaded.contains(key));
    assert_eq!(abom.len(), reloaded.len());

    Ok(())
}

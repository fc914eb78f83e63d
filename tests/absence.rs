use abom::{Abom, AbomConfig, Result};

#[test]
fn keys_never_inserted_are_absent() -> Result<()> {
    let mut abom = Abom::new(AbomConfig::legacy());

    for i in 0..1_000u32 {
        abom.insert(format!("{i:064x}").as_str())?;
    }

    for i in 1_000_000..1_001_000u32 {
        assert!(!abom.contains(format!("{i:064x}").as_str()));
    }

    Ok(())
}

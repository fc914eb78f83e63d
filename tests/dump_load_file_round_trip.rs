use abom::{Abom, AbomConfig, Result};
use std::fs::File;
use std::io::Seek;

#[test]
fn dump_to_file_and_load_back() -> Result<()> {
    let config = AbomConfig::tuned();
    let mut abom = Abom::new(config);
    abom.insert("d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a")?;
    abom.insert("00112233445566778899aabbccddeeff0011223344556677889900112233ab")?;

    let mut file: File = tempfile::tempfile().expect("failed to create temp file");
    abom.dump(&mut file)?;
    file.rewind().expect("failed to rewind temp file");

    let reloaded = abom::load(&mut file, config, true)?;

    assert!(reloaded.contains("d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a"));
    assert!(reloaded.contains("00112233445566778899aabbccddeeff0011223344556677889900112233ab"));
    assert_eq!(abom.len(), reloaded.len());

    Ok(())
}

use abom::{Abom, AbomConfig, Encode, Result};
use byteorder::{LittleEndian, WriteBytesExt};

/// Rewrites a profile-A stream's `l` field to the profile-B convention
/// (byte length instead of bit length) and checks it still decodes to the
/// same container.
#[test]
fn profile_b_framed_payload_decodes_identically() -> Result<()> {
    let config = AbomConfig::tuned();
    let mut abom = Abom::new(config);
    abom.insert("d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a")?;

    let profile_a = abom.encode_into_vec();

    // header layout: magic(4) | version(1) | n(2) | p1_q(4) | l(4) | payload
    let (header, payload) = profile_a.split_at(15);
    let mut profile_b = Vec::with_capacity(profile_a.len());
    profile_b.extend_from_slice(&header[..11]);
    profile_b.write_u32::<LittleEndian>(payload.len() as u32)?;
    profile_b.extend_from_slice(payload);

    let reloaded = abom::load(&profile_b[..], config, true)?;
    assert!(reloaded.contains("d453920b4ebea035876a3e43af9f17e8d6ebb26f9ea084d2cdcee32d1c14a2a"));

    Ok(())
}

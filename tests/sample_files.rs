use std::path::Path;

use anyhow::{Context, Result};
use vncodec::grp::GrpArchive;
use vncodec::seraphim::decode_cf;

/// Integration test over a real archive; place a sample at
/// `testcase/sample.grp` and run with `--ignored`.
#[test]
#[ignore]
fn unpack_sample_grp() -> Result<()> {
    let p = Path::new("testcase/sample.grp");
    assert!(p.exists(), "place a sample file at testcase/sample.grp");
    let arc = GrpArchive::open(p).context("open and parse")?;
    assert!(!arc.entries.is_empty());
    for e in &arc.entries {
        let data = arc.open_entry(e).with_context(|| e.name.clone())?;
        assert_eq!(data.len(), e.unpacked_size, "{}", e.name);
    }
    Ok(())
}

#[test]
#[ignore]
fn decode_sample_cf() -> Result<()> {
    let p = Path::new("testcase/sample.cf");
    if !p.exists() {
        return Ok(());
    }
    let data = std::fs::read(p)?;
    let img = decode_cf(&data).context("decode")?;
    let expected = usize::from(img.width) * usize::from(img.height) * 3;
    assert_eq!(img.pixels.len(), expected, "unexpected pixel buffer size");
    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use vncodec::grp::GrpArchive;
use vncodec::seraphim::{decode_cb, decode_cf, decode_ct, SeraphImage, CF_SIGNATURE, CT_SIGNATURE};

#[derive(Parser)]
#[command(name = "vncodec")]
#[command(about = "Unpack Ankh GRP archives and Seraphim engine images", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the entries of a GRP archive
    List {
        /// Input .grp file path
        input: PathBuf,

        /// Print the directory as JSON
        #[arg(long)]
        json: bool,
    },

    /// Unpack every entry of a GRP archive into a directory
    Extract {
        /// Input .grp file path
        input: PathBuf,

        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },

    /// Decode a Seraphim CF/CT/CB image to PPM
    Image {
        /// Input image file path
        input: PathBuf,

        /// Output .ppm path (defaults to the input with a .ppm extension)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::List { input, json } => {
            let arc = GrpArchive::open(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&arc.entries)?);
            } else {
                for e in &arc.entries {
                    println!(
                        "{:>8}  {:>8}  {}{}",
                        e.size,
                        e.unpacked_size,
                        e.name,
                        if e.is_packed { "  (packed)" } else { "" }
                    );
                }
            }
        }
        Command::Extract { input, out } => {
            fs::create_dir_all(&out).with_context(|| format!("create out dir: {out:?}"))?;
            let arc = GrpArchive::open(&input)?;
            let mut failed = 0usize;
            for e in &arc.entries {
                match arc.open_entry(e) {
                    Ok(data) => {
                        let path = out.join(&e.name);
                        fs::write(&path, data).with_context(|| format!("write: {path:?}"))?;
                    }
                    Err(err) => {
                        // One corrupt entry should not abort the rest.
                        log::warn!("{}: {err:#}", e.name);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                eprintln!("{failed} entr(y/ies) failed to unpack");
            }
        }
        Command::Image { input, out } => {
            let data = fs::read(&input).with_context(|| format!("open: {input:?}"))?;
            let image = decode_any(&data)?;
            let out = out.unwrap_or_else(|| input.with_extension("ppm"));
            write_ppm(&out, &image)?;
            eprintln!("wrote {out:?}");
        }
    }

    Ok(())
}

fn decode_any(data: &[u8]) -> Result<SeraphImage> {
    if data.len() < 4 {
        bail!("file too short");
    }
    let signature = u32::from_le_bytes(data[0..4].try_into().unwrap());
    if signature == CF_SIGNATURE {
        decode_cf(data)
    } else if signature == CT_SIGNATURE {
        decode_ct(data)
    } else if data[0] == b'C' && data[1] == b'B' {
        decode_cb(data)
    } else {
        bail!("unrecognized image signature {signature:#010x}");
    }
}

fn write_ppm(path: &Path, image: &SeraphImage) -> Result<()> {
    use std::io::Write;

    let w = usize::from(image.width);
    let h = usize::from(image.height);
    let mut out = Vec::with_capacity(w * h * 3 + 64);
    out.extend_from_slice(format!("P6\n{} {}\n255\n", image.width, image.height).as_bytes());
    match image.bpp {
        // Stored byte order is BGR(A); PPM wants RGB.
        24 => {
            for px in image.pixels.chunks_exact(3) {
                out.extend_from_slice(&[px[2], px[1], px[0]]);
            }
        }
        32 => {
            for px in image.pixels.chunks_exact(4) {
                out.extend_from_slice(&[px[2], px[1], px[0]]);
            }
        }
        8 => {
            let palette = image.palette.as_deref().context("paletted image without palette")?;
            for &i in &image.pixels {
                let [r, g, b] = palette[usize::from(i)];
                out.extend_from_slice(&[r, g, b]);
            }
        }
        other => bail!("unsupported bpp {other}"),
    }
    let mut f = fs::File::create(path).with_context(|| format!("create: {path:?}"))?;
    f.write_all(&out)?;
    Ok(())
}

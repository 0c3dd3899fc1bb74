use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use reframe::cli::{Cli, Commands, EncodeArgs};
use reframe::{
    calculate_aspect_ratio, format_file_size, generate_output_path, geometry, orientation,
    parse_dimensions, BatchRunner, Encoder, EncoderConfig, Image, Loader, SourceFormat,
};
use std::path::{Path, PathBuf};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Resize {
            input,
            width,
            height,
            short_side,
            long_side,
            fit,
            allow_enlarge,
            encode,
        } => {
            let mut image = Loader::new().load_path(&input)?;

            match (width, height, short_side, long_side, fit) {
                (Some(w), Some(h), _, _, _) => geometry::resize(&mut image, w, h, allow_enlarge)?,
                (Some(w), None, _, _, _) => geometry::resize_to_width(&mut image, w, allow_enlarge)?,
                (None, Some(h), _, _, _) => {
                    geometry::resize_to_height(&mut image, h, allow_enlarge)?
                }
                (_, _, Some(short), _, _) => {
                    geometry::resize_to_short_side(&mut image, short, allow_enlarge)?
                }
                (_, _, _, Some(long), _) => {
                    geometry::resize_to_long_side(&mut image, long, allow_enlarge)?
                }
                (_, _, _, _, Some(bounds)) => {
                    let (max_w, max_h) = parse_dimensions(&bounds)
                        .with_context(|| format!("invalid --fit bounds: {}", bounds))?;
                    geometry::resize_to_best_fit(&mut image, max_w, max_h, allow_enlarge)?
                }
                _ => bail!("specify one of --width, --height, --short-side, --long-side or --fit"),
            }

            save_result(&image, &input, "resized", &encode)?;
        }

        Commands::Scale {
            input,
            percent,
            encode,
        } => {
            let mut image = Loader::new().load_path(&input)?;
            geometry::scale(&mut image, percent)?;
            save_result(&image, &input, "scaled", &encode)?;
        }

        Commands::Crop {
            input,
            width,
            height,
            position,
            allow_enlarge,
            encode,
        } => {
            let mut image = Loader::new().load_path(&input)?;
            geometry::crop(&mut image, width, height, allow_enlarge, position.into())?;
            save_result(&image, &input, "cropped", &encode)?;
        }

        Commands::FreeCrop {
            input,
            width,
            height,
            x,
            y,
            encode,
        } => {
            let mut image = Loader::new().load_path(&input)?;
            geometry::free_crop(&mut image, width, height, x, y)?;
            save_result(&image, &input, "cropped", &encode)?;
        }

        Commands::Info { input } => {
            print_info(&input)?;
        }

        Commands::Batch {
            input,
            output,
            fit,
            recursive,
            threads,
            format,
            filter,
        } => {
            let (max_w, max_h) = parse_dimensions(&fit)
                .with_context(|| format!("invalid --fit bounds: {}", fit))?;

            let config = EncoderConfig {
                filter: filter.into(),
                ..Default::default()
            };
            let runner = BatchRunner::new(config, threads)?;
            let stats = runner.run(
                &input,
                &output,
                recursive,
                format.map(SourceFormat::from),
                |image| geometry::resize_to_best_fit(image, max_w, max_h, false),
            )?;

            println!(
                "Batch complete: {} processed, {} failed, output in {}",
                stats.processed,
                stats.errors.len(),
                output.display()
            );
        }
    }

    Ok(())
}

fn encoder_config(encode: &EncodeArgs) -> EncoderConfig {
    EncoderConfig {
        prefer_truecolor: !encode.no_truecolor,
        filter: encode.filter.into(),
        ..Default::default()
    }
}

fn save_result(
    image: &Image,
    input: &Path,
    suffix: &str,
    encode: &EncodeArgs,
) -> anyhow::Result<PathBuf> {
    let format = encode.format.map(SourceFormat::from);
    let quality = encode.quality.or(encode.png_compression);

    let output_path = generate_output_path(
        input,
        encode.output.as_deref(),
        suffix,
        format.map(SourceFormat::extension),
    );

    let permissions = encode
        .chmod
        .as_deref()
        .map(|mode| {
            u32::from_str_radix(mode, 8).with_context(|| format!("invalid --chmod mode: {}", mode))
        })
        .transpose()?;

    let encoder = Encoder::new(encoder_config(encode))?;
    encoder.save(image, &output_path, format, quality, permissions)?;

    println!("Saved to: {}", output_path.display());
    Ok(output_path)
}

fn print_info(input: &Path) -> anyhow::Result<()> {
    let metadata = std::fs::metadata(input)
        .with_context(|| format!("cannot stat {}", input.display()))?;

    let data = std::fs::read(input)?;
    let image = Loader::new().load_bytes(&data)?;
    let orientation_code = orientation::orientation_code(&data);

    println!("=== Image Information ===");
    println!("File: {}", input.display());
    println!("Size: {}", format_file_size(metadata.len()));
    println!(
        "Dimensions: {} x {} pixels",
        image.orig_width(),
        image.orig_height()
    );
    println!(
        "Aspect ratio: {:.2}",
        calculate_aspect_ratio(image.orig_width(), image.orig_height())
    );
    println!("Format: {}", image.format());
    println!("Truecolor: {}", image.is_truecolor());
    match orientation_code {
        Some(code) => println!("EXIF orientation: {}", code),
        None => println!("EXIF orientation: none"),
    }

    Ok(())
}

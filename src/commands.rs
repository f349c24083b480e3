//! Dispatch from parsed CLI arguments to the batch operations.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use log::info;

use crate::cli::Commands;
use crate::engine::Engine;
use crate::ops::{CancelToken, annotate, compress, document, ocr, redact, sign};

const ALL_PAGES: &str = "1-";

pub fn run<E: Engine>(engine: &E, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Info { file } => {
            let info = document::info(engine, &file)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Merge { files, output } => {
            document::merge(engine, &files, &output)?;
            println!("Merged {} files. Saved: {}", files.len(), output.display());
        }

        Commands::Split {
            file,
            pages,
            output_dir,
        } => {
            let pages = pages.as_deref().unwrap_or(ALL_PAGES);
            let written = document::split(engine, &file, pages, &output_dir)?;
            println!("Wrote {} files to: {}", written.len(), output_dir.display());
        }

        Commands::Rotate {
            file,
            pages,
            degrees,
            output,
        } => {
            let pages = pages.as_deref().unwrap_or(ALL_PAGES);
            document::rotate(engine, &file, pages, degrees, &output)?;
            println!("Saved: {}", output.display());
        }

        Commands::ExtractText { file, output } => match output {
            Some(path) => {
                document::extract_text(engine, &file, &path)?;
                println!("Saved: {}", path.display());
            }
            None => print!("{}", document::collect_text(engine, &file)?),
        },

        Commands::ExtractImages { file, output_dir } => {
            let count = document::extract_images(engine, &file, &output_dir)?;
            println!("Extracted {count} images to: {}", output_dir.display());
        }

        Commands::Compress {
            file,
            output,
            quality,
            max_dpi,
        } => {
            let report = compress::compress_document(
                engine,
                &file,
                &output,
                quality,
                max_dpi,
                &CancelToken::new(),
            )?;
            println!(
                "Recompressed {} images ({} skipped). Saved: {}",
                report.replaced(),
                report.skipped(),
                output.display()
            );
        }

        Commands::Ocrpdf {
            file,
            output,
            dpi,
            lang,
        } => {
            let recognizer = ocr::TesseractRecognizer::default();
            let mut progress = |done: usize, total: usize| {
                info!("OCR page {done}/{total}");
            };
            let completed = ocr::ocr_document(
                engine,
                &recognizer,
                &file,
                &output,
                dpi,
                &lang,
                &CancelToken::new(),
                Some(&mut progress),
            )?;
            if completed {
                println!("Saved: {}", output.display());
            }
        }

        Commands::Highlight { file, text, output } => {
            let hits = annotate::highlight_text(engine, &file, &output, &text)?;
            println!("Highlighted {hits} instances. Saved: {}", output.display());
        }

        Commands::Watermark {
            file,
            text,
            output,
            opacity,
        } => {
            annotate::watermark_text(engine, &file, &output, &text, opacity)?;
            println!("Saved: {}", output.display());
        }

        Commands::Redact { file, text, output } => {
            let hits = redact::redact_text(engine, &file, &output, &text)?;
            println!("Redacted {hits} instances. Saved: {}", output.display());
        }

        Commands::Stamp {
            file,
            output,
            header,
            footer,
            size,
        } => {
            anyhow::ensure!(
                header.is_some() || footer.is_some(),
                "nothing to stamp: pass --header and/or --footer"
            );
            annotate::stamp_header_footer(
                engine,
                &file,
                &output,
                header.as_deref(),
                footer.as_deref(),
                size,
            )?;
            println!("Saved: {}", output.display());
        }

        Commands::Sign {
            file,
            output,
            pfx,
            pfx_password,
        } => {
            let password = match pfx_password {
                Some(pw) => pw,
                None => prompt_password().context("reading credential password")?,
            };
            sign::ExternalSigner::default().sign(&file, &output, &pfx, &password)?;
            println!("Signed. Saved: {}", output.display());
        }
    }
    Ok(())
}

fn prompt_password() -> io::Result<String> {
    eprint!("PFX password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

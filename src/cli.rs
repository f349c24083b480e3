use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Inspect, restructure, annotate and OCR PDF documents.
#[derive(Debug, Parser)]
#[command(name = "pdfcraft", about, version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print document summary as JSON
    Info {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Merge several documents into one
    Merge {
        /// Input PDF files, in output order
        #[arg(value_name = "FILE", required = true, num_args = 2..)]
        files: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write selected pages to per-page files
    Split {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5,8-'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Rotate pages by a multiple of 90 degrees
    Rotate {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Rotation to add, in degrees (multiples of 90)
        #[arg(long, default_value_t = 90, allow_hyphen_values = true)]
        degrees: i32,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Extract plain text with page separators
    ExtractText {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output text file. Default: stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Save embedded raster images as PNG files
    ExtractImages {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,
    },

    /// Downsample and recompress embedded images
    Compress {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// JPEG quality (1-95)
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u8).range(1..=95))]
        quality: u8,

        /// Downsample images above this resolution
        #[arg(long, default_value_t = 200)]
        max_dpi: u32,
    },

    /// Add a searchable text layer using Tesseract
    Ocrpdf {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Render resolution for recognition
        #[arg(long, default_value_t = 300)]
        dpi: u32,

        /// Tesseract language code
        #[arg(long, default_value = "eng")]
        lang: String,
    },

    /// Highlight every occurrence of a phrase
    Highlight {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Phrase to highlight
        #[arg(value_name = "TEXT")]
        text: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Stamp a diagonal translucent watermark on every page
    Watermark {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Watermark text
        #[arg(value_name = "TEXT")]
        text: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Text opacity (0-1)
        #[arg(long, default_value_t = 0.15)]
        opacity: f32,
    },

    /// Remove every occurrence of a phrase from page content
    Redact {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Phrase to redact
        #[arg(value_name = "TEXT")]
        text: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Add header and/or footer text in the page margins
    Stamp {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Header text, centered in the top margin
        #[arg(long)]
        header: Option<String>,

        /// Footer text, centered in the bottom margin
        #[arg(long)]
        footer: Option<String>,

        /// Font size in points
        #[arg(long, default_value_t = 10.0)]
        size: f32,
    },

    /// Digitally sign with a PKCS#12 credential via pyHanko
    Sign {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// PKCS#12 (.pfx/.p12) credential file
        #[arg(long)]
        pfx: PathBuf,

        /// Credential password. Prompted for when omitted
        #[arg(long)]
        pfx_password: Option<String>,
    },
}

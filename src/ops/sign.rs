//! Digital signing, delegated to an external signing tool (the pyHanko
//! CLI by default). Availability is verified before any I/O so a missing
//! tool never produces a half-written output.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

const SIGNATURE_FIELD: &str = "Sig1";

#[derive(Clone, Debug)]
pub struct ExternalSigner {
    program: PathBuf,
}

impl Default for ExternalSigner {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pyhanko"),
        }
    }
}

impl ExternalSigner {
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    /// Sign `input` with a PKCS#12 (.pfx/.p12) credential.
    pub fn sign(
        &self,
        input: &Path,
        output: &Path,
        pfx: &Path,
        pfx_password: &str,
    ) -> Result<()> {
        if !self.is_available() {
            return Err(Error::DependencyUnavailable(
                self.program.display().to_string(),
            ));
        }
        let result = Command::new(&self.program)
            .args(["sign", "addsig", "--field", SIGNATURE_FIELD, "-P"])
            .arg(pfx_password)
            .arg("-p")
            .arg(pfx)
            .arg(input)
            .arg(output)
            .output()?;
        if !result.status.success() {
            return Err(Error::engine(format!(
                "signing failed: {}",
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }
        Ok(())
    }
}

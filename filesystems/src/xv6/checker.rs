// xv6 consistency check driver
// Decodes the image once, then runs the validators in rule order and stops at the first failure.

use super::image::Xv6Image;
use super::validators::{default_validators, Validator};
use fcheck_core::FsckResult;
use log::{debug, info, warn};

pub struct Checker<'a> {
    fs: Xv6Image<'a>,
    validators: Vec<Box<dyn Validator>>,
}

impl<'a> Checker<'a> {
    pub fn new(bytes: &'a [u8]) -> FsckResult<Self> {
        Ok(Self {
            fs: Xv6Image::new(bytes)?,
            validators: default_validators(),
        })
    }

    pub fn image(&self) -> &Xv6Image<'a> {
        &self.fs
    }

    /// Validator names in the order they run
    pub fn validators(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Run every validator. The image is never modified, so repeated runs give the same result.
    pub fn run(&self) -> FsckResult<()> {
        for validator in &self.validators {
            debug!("Checking {} (rules {:?})", validator.name(), validator.rules());
            if let Err(e) = validator.validate(&self.fs) {
                match e.violation() {
                    Some(v) => warn!("{} failed: rule {} broken ({:?})", validator.name(), v.rule(), v),
                    None => warn!("{} could not complete: {}", validator.name(), e),
                }
                return Err(e);
            }
        }
        info!("Image is consistent ({} validators passed)", self.validators.len());
        Ok(())
    }
}

/// Check a whole image buffer.
pub fn check_image(bytes: &[u8]) -> FsckResult<()> {
    Checker::new(bytes)?.run()
}

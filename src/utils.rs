use flate2::read::GzDecoder;
use std::fs::OpenOptions;
use std::io::{self, stdin, BufReader, Read};
use std::path::Path;

/// Fatal precondition violation: an inconsistency between the fragment map
/// and the joined sequence. These are programming-contract errors, not
/// recoverable conditions, so the run aborts with the offending context.
pub fn precondition_fatal<S: AsRef<str>>(header: S, msg: &str) -> ! {
    log::error!("[{}] {}", header.as_ref(), msg);
    std::process::exit(1);
}

pub fn xopen<'a>(path: &'a Path) -> Result<Box<dyn Read + 'a>, io::Error> {
    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::new(stdin())));
    }

    let file = OpenOptions::new().read(true).open(path)?;
    Ok(Box::new(BufReader::new(file)))
}

/// Open a sequence file, decompressing transparently if it ends in .gz.
pub fn xzopen<'a>(path: &'a Path) -> Result<Box<dyn Read + 'a>, io::Error> {
    let input = xopen(path)?;
    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        Ok(Box::new(GzDecoder::new(input)))
    } else {
        Ok(input)
    }
}

use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::VideoWriter as CvVideoWriter,
};
use std::path::{Path, PathBuf};

use super::{VideoWriter, WriterFactory, WriterSpec};
use crate::error::RecordError;

/// Opens OpenCV `VideoWriter`s
#[derive(Debug, Default)]
pub struct OpenCvWriterFactory;

/// BGR frames into an OpenCV-encoded file. Released on drop as well.
pub struct OpenCvVideoWriter {
    writer: CvVideoWriter,
    path: PathBuf,
    released: bool,
}

fn fourcc_code(tag: &str, path: &Path) -> Result<i32, RecordError> {
    let chars: Vec<char> = tag.chars().collect();
    match chars.as_slice() {
        &[a, b, c, d] => CvVideoWriter::fourcc(a, b, c, d).map_err(|e| RecordError::writer_io(path, e)),
        _ => Err(RecordError::writer_io(
            path,
            format!("fourcc must be 4 characters, got {:?}", tag),
        )),
    }
}

impl WriterFactory for OpenCvWriterFactory {
    type Writer = OpenCvVideoWriter;

    fn open(&mut self, path: &Path, spec: &WriterSpec) -> Result<OpenCvVideoWriter, RecordError> {
        let fourcc = fourcc_code(&spec.fourcc, path)?;
        let (w, h) = spec.frame_size;
        let filename = path.to_string_lossy();

        let writer = CvVideoWriter::new(
            &filename,
            fourcc,
            spec.fps,
            Size::new(w as i32, h as i32),
            true,
        )
        .map_err(|e| RecordError::writer_io(path, e))?;

        if !writer.is_opened().map_err(|e| RecordError::writer_io(path, e))? {
            return Err(RecordError::writer_io(path, "video writer did not open"));
        }

        Ok(OpenCvVideoWriter {
            writer,
            path: path.to_path_buf(),
            released: false,
        })
    }
}

impl VideoWriter for OpenCvVideoWriter {
    type Frame = Mat;

    fn write(&mut self, frame: &Mat) -> Result<(), RecordError> {
        self.writer
            .write(frame)
            .map_err(|e| RecordError::writer_io(&self.path, e))
    }

    fn release(mut self) -> Result<(), RecordError> {
        self.released = true;
        self.writer
            .release()
            .map_err(|e| RecordError::writer_io(&self.path, e))
    }
}

impl Drop for OpenCvVideoWriter {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.writer.release() {
                log::warn!("releasing {}: {}", self.path.display(), e);
            }
        }
    }
}

//! 控制台输出 Sink 实现
//!
//! 将记录编码后写入标准输出（或任意 `Write` 目标）。写入器由互斥锁保护，
//! 多个线程同时记录时每行输出保持完整。

use crate::config::OutputFormat;
use crate::core::level::Level;
use crate::core::record::Record;
use crate::sinks::encoder::Encoder;
use crate::sinks::traits::{LogSink, SinkError, SinkMetadata, SinkResult};
use serde_json::Value;
use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

/// 控制台输出 Sink
pub struct ConsoleSink {
    threshold: Level,
    encoder: Encoder,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    /// 创建写入标准输出的 sink
    pub fn stdout(threshold: Level, format: OutputFormat, colored: bool) -> Self {
        Self::with_writer(
            threshold,
            Encoder::from_format(format, colored),
            Box::new(io::stdout()),
        )
    }

    /// 使用自定义写入器创建 sink
    pub fn with_writer(threshold: Level, encoder: Encoder, writer: Box<dyn Write + Send>) -> Self {
        Self {
            threshold,
            encoder,
            writer: Mutex::new(writer),
        }
    }

    /// 获取编码器
    pub fn encoder(&self) -> Encoder {
        self.encoder
    }
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("threshold", &self.threshold)
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}

impl LogSink for ConsoleSink {
    fn threshold(&self) -> Level {
        self.threshold
    }

    fn write_record(&self, record: &Record, static_fields: &[(String, Value)]) -> SinkResult<()> {
        let line = self.encoder.encode(record, &[static_fields])?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::Poisoned("console"))?;
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn flush(&self) -> SinkResult<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::Poisoned("console"))?;
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }

    fn metadata(&self) -> SinkMetadata {
        SinkMetadata::new(self.name().to_string(), self.threshold)
            .with_description(format!("Console sink using {:?} encoding", self.encoder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<StdMutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_console_sink_writes_json_line() {
        let buffer = SharedBuffer::default();
        let sink = ConsoleSink::with_writer(Level::Debug, Encoder::Json, Box::new(buffer.clone()));
        let record = Record::new(
            Level::Info,
            "Test message".to_string(),
            vec![("k".to_string(), json!("v"))],
        );
        let statics = vec![("service".to_string(), json!("svc"))];

        sink.write_record(&record, &statics).unwrap();

        let output = buffer.contents();
        assert_eq!(output.lines().count(), 1);
        let value: Value = serde_json::from_str(output.trim_end()).unwrap();
        assert_eq!(value["message"], "Test message");
        assert_eq!(value["service"], "svc");
        assert_eq!(value["k"], "v");
    }

    #[test]
    fn test_console_sink_reports_write_error() {
        let sink = ConsoleSink::with_writer(Level::Debug, Encoder::Json, Box::new(BrokenWriter));
        let record = Record::new(Level::Info, "m".to_string(), Vec::new());
        assert!(matches!(
            sink.write_record(&record, &[]),
            Err(SinkError::Io(_))
        ));
    }

    #[test]
    fn test_concurrent_writes_keep_lines_intact() {
        let buffer = SharedBuffer::default();
        let sink = Arc::new(ConsoleSink::with_writer(
            Level::Debug,
            Encoder::Json,
            Box::new(buffer.clone()),
        ));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let record = Record::new(
                            Level::Info,
                            format!("worker {} line {}", i, j),
                            Vec::new(),
                        );
                        sink.write_record(&record, &[]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let output = buffer.contents();
        assert_eq!(output.lines().count(), 200);
        for line in output.lines() {
            let value: Value = serde_json::from_str(line).unwrap();
            assert!(value["message"].as_str().unwrap().starts_with("worker"));
        }
    }

    #[test]
    fn test_metadata() {
        let sink = ConsoleSink::stdout(Level::Warn, OutputFormat::Pretty, false);
        let metadata = sink.metadata();
        assert_eq!(metadata.name, "console");
        assert_eq!(metadata.threshold, Level::Warn);
        assert_eq!(sink.encoder(), Encoder::Pretty { colored: false });
    }
}

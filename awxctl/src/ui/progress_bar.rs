//! Byte counter for streams of unknown length, such as a database dump.

use tokio::io::{AsyncRead, AsyncWrite};

pub struct ByteProgressBar {
    inner: indicatif::ProgressBar,
    done_message: &'static str,
}

impl ByteProgressBar {
    /// Creates a spinner showing `message` with the number of bytes
    /// transferred so far, drawn on stderr.
    ///
    /// # Panics
    ///
    /// Never in practice; the template is a constant.
    pub fn new(message: &'static str, done_message: &'static str) -> Self {
        let inner = indicatif::ProgressBar::new_spinner();
        inner.set_style(
            indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {bytes} ({bytes_per_sec}) {msg}")
                .expect("the template is valid"),
        );
        inner.set_message(message);
        inner.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { inner, done_message }
    }

    pub fn set_length(&self, len: u64) { self.inner.set_length(len); }

    pub fn wrap_async_write<W>(&self, write: W) -> impl AsyncWrite + Unpin + use<W>
    where
        W: AsyncWrite + Unpin,
    {
        self.inner.wrap_async_write(write)
    }

    pub fn wrap_async_read<R>(&self, read: R) -> impl AsyncRead + Unpin + use<R>
    where
        R: AsyncRead + Unpin,
    {
        self.inner.wrap_async_read(read)
    }

    pub fn finish(self) { self.inner.finish_with_message(self.done_message); }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn test_wrapped_streams_pass_data_through() {
        let progress = ByteProgressBar::new("Copying", "Copy completed");
        progress.set_length(11);

        let mut reader = progress.wrap_async_read(&b"hello world"[..]);
        let mut data = Vec::new();
        let _size = reader.read_to_end(&mut data).await.unwrap();
        assert_eq!(data, b"hello world");

        let mut sink = Vec::new();
        {
            let mut writer = progress.wrap_async_write(&mut sink);
            writer.write_all(b"dump").await.unwrap();
            writer.flush().await.unwrap();
        }
        assert_eq!(sink, b"dump");
        progress.finish();
    }
}

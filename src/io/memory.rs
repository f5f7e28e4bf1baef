use super::ReadAt;
use anyhow::Result;
use async_trait::async_trait;

/// Read-only view over an archive held in memory
pub struct MemoryReader<'a> {
    data: &'a [u8],
}

impl<'a> MemoryReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ReadAt for MemoryReader<'_> {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        if start >= self.data.len() {
            return Ok(0);
        }

        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

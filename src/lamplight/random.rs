use rand::{Error, RngCore};

/// 픽셀 하나, 프레임 하나 동안만 쓰이는 난수 생성기.
///
/// 시드가 `(pixel_index, frame_index, seed)`로만 정해지기 때문에 스레드끼리 상태를
/// 공유하지 않고, 같은 입력이면 언제나 같은 수열이 나옴.
#[derive(Debug, Clone)]
pub struct PixelRng {
    state: u64,
}

impl PixelRng {
    pub fn new(pixel_index: u32, frame_index: u32, seed: u64) -> Self {
        let key = seed ^ ((frame_index as u64) << 32) ^ pixel_index as u64;
        let state = splitmix(key);

        // 상태가 0이면 xorshift가 영원히 0만 뱉음
        Self {
            state: if state == 0 { 0x9e37_79b9_7f4a_7c15 } else { state },
        }
    }
}

fn splitmix(mut value: u64) -> u64 {
    value = value.wrapping_add(0x9e37_79b9_7f4a_7c15);
    value = (value ^ (value >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    value = (value ^ (value >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    value ^ (value >> 31)
}

impl RngCore for PixelRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    // xorshift64*
    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

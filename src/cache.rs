use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("associativity must be at least 1")]
    ZeroAssociativity,
    #[error("set bits ({set_bits}) plus block bits ({block_bits}) must be less than 64")]
    AddressWidthExceeded { set_bits: u32, block_bits: u32 },
}

/// Cache geometry: 2^set_bits sets, associativity lines per set,
/// 2^block_bits bytes per block.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    pub set_bits: u32,
    pub associativity: u64,
    pub block_bits: u32,
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.associativity == 0 {
            return Err(ConfigError::ZeroAssociativity);
        }
        // the tag shift below must stay within a 64-bit address; widen
        // before adding so huge bit counts cannot wrap around u32
        if u64::from(self.set_bits) + u64::from(self.block_bits) >= u64::from(u64::BITS) {
            return Err(ConfigError::AddressWidthExceeded {
                set_bits: self.set_bits,
                block_bits: self.block_bits,
            });
        }
        Ok(())
    }

    pub fn num_sets(&self) -> u64 {
        1 << self.set_bits
    }
}

/// What a single memory reference did to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit,
    Miss,
    MissWithEviction,
}

impl std::fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessOutcome::Hit => write!(f, "hit"),
            AccessOutcome::Miss => write!(f, "miss"),
            AccessOutcome::MissWithEviction => write!(f, "miss eviction"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheLine {
    valid: bool,
    tag: u64,
    recency: u64,
}

struct CacheSet {
    lines: Vec<CacheLine>,
}

impl CacheSet {
    fn new(associativity: u64) -> CacheSet {
        CacheSet {
            lines: vec![
                CacheLine {
                    valid: false,
                    tag: 0,
                    recency: 0,
                };
                associativity as usize
            ],
        }
    }

    /// Look the tag up in this set, filling or evicting on a miss.
    /// `stamp` is the already-advanced value of the shared recency clock.
    fn access(&mut self, tag: u64, stamp: u64) -> AccessOutcome {
        // if the tag is already resident, refresh its recency
        if let Some(line) = self.lines.iter_mut().find(|l| l.valid && l.tag == tag) {
            line.recency = stamp;
            return AccessOutcome::Hit;
        }

        // cold miss: fill the first empty line
        if let Some(line) = self.lines.iter_mut().find(|l| !l.valid) {
            line.valid = true;
            line.tag = tag;
            line.recency = stamp;
            return AccessOutcome::Miss;
        }

        // set is full: evict the least recently used line,
        // lowest index winning a recency tie
        let mut victim = 0;
        for (index, line) in self.lines.iter().enumerate() {
            if line.recency < self.lines[victim].recency {
                victim = index;
            }
        }
        let line = &mut self.lines[victim];
        line.tag = tag;
        line.recency = stamp;
        AccessOutcome::MissWithEviction
    }
}

pub struct Cache {
    sets: Vec<CacheSet>,
    set_bits: u32,
    block_bits: u32,
    clock: u64,
}

impl Cache {
    pub fn new(config: CacheConfig) -> Result<Cache, ConfigError> {
        config.validate()?;
        let sets = (0..config.num_sets())
            .map(|_| CacheSet::new(config.associativity))
            .collect();
        Ok(Cache {
            sets,
            set_bits: config.set_bits,
            block_bits: config.block_bits,
            clock: 0,
        })
    }

    /// Split an address into (set_index, tag), dropping the block offset bits.
    fn decode(&self, address: u64) -> (usize, u64) {
        let set_index = (address >> self.block_bits) & ((1 << self.set_bits) - 1);
        let tag = address >> (self.set_bits + self.block_bits);
        (set_index as usize, tag)
    }

    /// Run one memory reference through the cache. Every call advances the
    /// shared recency clock by one and restamps exactly one line, so touches
    /// are totally ordered across all sets and LRU selection is unambiguous.
    pub fn access(&mut self, address: u64) -> AccessOutcome {
        let (set_index, tag) = self.decode(address);
        self.clock += 1;
        self.sets[set_index].access(tag, self.clock)
    }
}

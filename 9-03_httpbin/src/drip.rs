//! `/drip` 응답의 바이트 배출 타이밍을 계산하는 generator.
//!
//! 총 `total_bytes` 바이트를 `duration_ms` 동안 최대한 고르게 흘려보내도록
//! [`DripEvent`] 시퀀스를 만든다. 실제 sleep / write 는 호출자(HTTP 스트림)의 몫이고,
//! 여기서는 "언제 몇 바이트를 쓸지"만 결정한다.
//!
//! 시간은 밀리초를 반환하는 closure 로 주입받으므로 테스트에서 시계를 마음대로 조작할 수 있다.

/// 두 이벤트 사이에 예약할 수 있는 가장 짧은 대기 시간 (ms)
pub const MIN_DELAY_MS: u64 = 10;

/// 호출자가 순서대로 재생하는 이벤트
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DripEvent {
    /// 주어진 밀리초만큼 대기
    Delay(u64),
    /// 주어진 개수의 바이트를 쓰고 flush
    Bytes(usize),
}

/// Creates a lazy drip sequence bound to the given time source.
///
/// `now` must return monotonic milliseconds. It is read three times per
/// step: before the write, after the write and after the delay.
pub fn drip<F>(total_bytes: usize, duration_ms: u64, now: F) -> Drip<F>
where
    F: FnMut() -> u64,
{
    Drip {
        now,
        remaining_bytes: total_bytes,
        remaining_ms: duration_ms,
        step: Step::Plan,
    }
}

/// [`drip`] 이 돌려주는 iterator. 한 번 끝나면 계속 `None` 을 반환한다.
pub struct Drip<F> {
    now: F,
    remaining_bytes: usize,
    remaining_ms: u64,
    step: Step,
}

#[derive(Debug, Clone, Copy)]
enum Step {
    // 다음 청크 크기를 정할 차례
    Plan,
    // Bytes 를 내보낸 직후. 호출자가 write 를 끝내고 다시 pull 하면 경과 시간을 잰다.
    Written { start: u64, bytes: usize, delay: u64 },
    // Delay 를 내보낸 직후 (또는 건너뜀). 남은 시간/바이트를 차감한다.
    Settle { start: u64, bytes: usize },
    Done,
}

impl<F> Drip<F>
where
    F: FnMut() -> u64,
{
    fn plan(&mut self) -> DripEvent {
        let remaining_bytes = self.remaining_bytes as u64;
        let per_byte = self.remaining_ms / remaining_bytes;

        let (bytes, delay) = if per_byte < MIN_DELAY_MS {
            // 바이트당 대기가 최소 단위보다 짧으면 한 window 분량을 묶어서 쓴다
            let window = MIN_DELAY_MS.min(self.remaining_ms);
            let bytes = (window * remaining_bytes / self.remaining_ms).clamp(1, remaining_bytes);
            (bytes as usize, window)
        } else {
            (1, per_byte)
        };

        let start = (self.now)();
        self.step = Step::Written {
            start,
            bytes,
            delay,
        };
        DripEvent::Bytes(bytes)
    }
}

impl<F> Iterator for Drip<F>
where
    F: FnMut() -> u64,
{
    type Item = DripEvent;

    fn next(&mut self) -> Option<DripEvent> {
        loop {
            match self.step {
                Step::Done => return None,

                Step::Plan => {
                    if self.remaining_bytes == 0 {
                        self.step = Step::Done;
                        return (self.remaining_ms > 0)
                            .then_some(DripEvent::Delay(self.remaining_ms));
                    }

                    // 남은 시간이 최소 대기 단위보다 짧으면 더 이상 나눠서 예약할 수 없음
                    if self.remaining_ms < MIN_DELAY_MS {
                        self.step = Step::Done;
                        return Some(DripEvent::Bytes(self.remaining_bytes));
                    }

                    return Some(self.plan());
                }

                Step::Written {
                    start,
                    bytes,
                    delay,
                } => {
                    let elapsed = (self.now)().saturating_sub(start);
                    self.step = Step::Settle { start, bytes };

                    if elapsed <= delay {
                        let delay = if bytes >= self.remaining_bytes {
                            // last chunk: stretch to the end of the window
                            self.remaining_ms.saturating_sub(elapsed)
                        } else {
                            delay - elapsed
                        };
                        return Some(DripEvent::Delay(delay));
                    }
                    // write 가 예정보다 오래 걸렸으면 이번 step 의 대기는 생략
                }

                Step::Settle { start, bytes } => {
                    let elapsed = (self.now)().saturating_sub(start);
                    self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
                    self.remaining_bytes -= bytes;
                    self.step = Step::Plan;
                }
            }
        }
    }
}

impl<F> std::iter::FusedIterator for Drip<F> where F: FnMut() -> u64 {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    use DripEvent::{Bytes, Delay};

    fn frozen_clock() -> impl FnMut() -> u64 {
        || 0
    }

    /// 주어진 타임스탬프를 순서대로 돌려주는 시계. 다 쓰면 마지막 값을 반복.
    fn scripted_clock(ticks: Vec<u64>) -> impl FnMut() -> u64 {
        let mut ticks = ticks.into_iter();
        let mut last = 0;
        move || {
            if let Some(tick) = ticks.next() {
                last = tick;
            }
            last
        }
    }

    /// Plays a drip back against a simulated clock: every write costs
    /// `write_cost` ms and every `Delay` advances the clock by exactly its length.
    fn play(total_bytes: usize, duration_ms: u64, write_cost: u64) -> Vec<DripEvent> {
        let clock = Rc::new(Cell::new(0u64));
        let reader = Rc::clone(&clock);
        let mut events = Vec::new();

        for event in drip(total_bytes, duration_ms, move || reader.get()) {
            match event {
                Delay(ms) => clock.set(clock.get() + ms),
                Bytes(_) => clock.set(clock.get() + write_cost),
            }
            events.push(event);
        }

        events
    }

    fn total_bytes(events: &[DripEvent]) -> usize {
        events
            .iter()
            .map(|event| match event {
                Bytes(n) => *n,
                Delay(_) => 0,
            })
            .sum()
    }

    fn total_delay(events: &[DripEvent]) -> u64 {
        events
            .iter()
            .map(|event| match event {
                Delay(ms) => *ms,
                Bytes(_) => 0,
            })
            .sum()
    }

    #[test]
    fn zero_bytes_only_waits() {
        assert_eq!(
            drip(0, 1500, frozen_clock()).collect::<Vec<_>>(),
            [Delay(1500)]
        );
        assert_eq!(drip(0, 3, frozen_clock()).collect::<Vec<_>>(), [Delay(3)]);
    }

    #[test]
    fn nothing_to_do() {
        assert!(drip(0, 0, frozen_clock()).next().is_none());
    }

    #[test]
    fn zero_duration_writes_everything_at_once() {
        assert_eq!(drip(42, 0, frozen_clock()).collect::<Vec<_>>(), [Bytes(42)]);
    }

    #[test]
    fn one_byte_per_step_when_budget_allows() {
        let clock = scripted_clock(vec![
            0, 0, 200, 200, 200, 400, 400, 400, 600, 600, 600, 800, 800, 800, 1000,
        ]);

        let events = drip(5, 1000, clock).collect::<Vec<_>>();

        assert_eq!(
            events,
            [
                Bytes(1),
                Delay(200),
                Bytes(1),
                Delay(200),
                Bytes(1),
                Delay(200),
                Bytes(1),
                Delay(200),
                Bytes(1),
                Delay(200),
            ]
        );
    }

    #[test]
    fn sub_granularity_duration_collapses_into_one_write() {
        assert_eq!(drip(10, 1, frozen_clock()).collect::<Vec<_>>(), [Bytes(10)]);
    }

    #[test]
    fn remainder_below_min_delay_is_not_scheduled() {
        // 9ms 는 최소 대기 단위보다 짧아서 Delay 없이 바로 씀
        assert_eq!(play(1, 9, 0), [Bytes(1)]);
        assert_eq!(play(3, 9, 0), [Bytes(3)]);
        // 10ms 부터는 대기를 예약함
        assert_eq!(play(1, 10, 0), [Bytes(1), Delay(10)]);
    }

    #[test]
    fn fine_pacing_is_batched_to_min_delay() {
        // 100 bytes / 200ms → 2ms per byte, so 5 bytes per 10ms window
        let events = play(100, 200, 0);

        assert_eq!(&events[..4], [Bytes(5), Delay(10), Bytes(5), Delay(10)]);
        assert_eq!(total_bytes(&events), 100);
        assert!(events
            .iter()
            .all(|event| !matches!(event, Delay(ms) if *ms < MIN_DELAY_MS)));
    }

    #[test]
    fn slow_writes_skip_the_delay() {
        // 두 번째 시각 읽기에서 이미 예정 대기(100ms)를 넘김
        let clock = scripted_clock(vec![0, 150, 150, 150, 150, 250]);

        let events = drip(2, 200, clock).collect::<Vec<_>>();

        assert_eq!(events, [Bytes(1), Bytes(1), Delay(50)]);
    }

    #[test]
    fn last_chunk_waits_out_the_whole_window() {
        // 마지막 청크에서는 per-byte 지연이 아닌 남은 전체 시간을 기다림
        let clock = scripted_clock(vec![0, 5, 300]);

        let events = drip(1, 300, clock).collect::<Vec<_>>();

        assert_eq!(events, [Bytes(1), Delay(295)]);
    }

    #[test]
    fn every_byte_is_written_exactly_once() {
        let cases = [
            (0, 0),
            (0, 10_000),
            (1, 0),
            (1, 9),
            (1, 10_000),
            (10, 2_000),
            (7, 99),
            (333, 1_000),
            (1_000, 10),
            (102_400, 0),
            (102_400, 10_000),
        ];

        for (bytes, duration) in cases {
            for write_cost in [0, 3, 25] {
                let events = play(bytes, duration, write_cost);
                assert_eq!(total_bytes(&events), bytes, "drip({bytes}, {duration})");
                assert!(
                    total_delay(&events) <= duration,
                    "drip({bytes}, {duration}) waited {}ms",
                    total_delay(&events)
                );
            }
        }
    }

    #[test]
    fn uses_the_whole_window_when_writes_are_free() {
        let events = play(10, 2_000, 0);

        assert_eq!(events.len(), 20);
        assert_eq!(total_delay(&events), 2_000);
    }

    #[test]
    fn exhausted_sequence_stays_exhausted() {
        let mut events = drip(3, 0, frozen_clock());

        assert_eq!(events.next(), Some(Bytes(3)));
        assert_eq!(events.next(), None);
        assert_eq!(events.next(), None);
    }
}

/*!
The compute core: parser, scheduler, pool, collector and serializer on one clock.

Every [`Device::tick`] advances each state machine once:

1. the serializer sends at most one byte
2. the collector drains at most one slot, if the serializer is free to take it
3. the scheduler makes one dispatch step
4. every engine advances its pipeline
5. the parser takes at most one byte, but only while the device is idle

Gating the parser on idleness means a command sent mid-sweep simply waits on the input
stream; in-flight work is never disturbed.
*/

use log::{debug, info};

use crate::{
    collector::ResultCollector,
    command::{CommandParser, ParseEvent},
    pool::EnginePool,
    scheduler::PixelScheduler,
    serializer::ResultSerializer,
    stream::{BeatQueue, ByteQueue, ByteSink, ByteSource},
    view::ViewCommand,
};

/// Bookkeeping for the sweep in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepStats {
    pub pixels: u64,
    pub started_at: u64,
}

pub struct Device {
    parser: CommandParser,
    scheduler: PixelScheduler,
    pool: EnginePool,
    collector: ResultCollector,
    serializer: ResultSerializer,
    ticks: u64,
    sweep: Option<SweepStats>,
    completed_sweeps: u64,
}

impl Device {
    pub fn new(pool: EnginePool) -> Self {
        Self {
            parser: CommandParser::new(),
            scheduler: PixelScheduler::new(),
            pool,
            collector: ResultCollector::new(),
            serializer: ResultSerializer::new(),
            ticks: 0,
            sweep: None,
            completed_sweeps: 0,
        }
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    pub fn scheduler(&self) -> &PixelScheduler {
        &self.scheduler
    }

    pub fn pool(&self) -> &EnginePool {
        &self.pool
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn completed_sweeps(&self) -> u64 {
        self.completed_sweeps
    }

    /// The sweep in flight, if any.
    pub fn sweep(&self) -> Option<SweepStats> {
        self.sweep
    }

    /// Every pixel dispatched, collected and sent.
    fn is_drained(&self) -> bool {
        self.scheduler.is_idle() && self.pool.is_quiescent() && self.collector.is_waiting()
    }

    /// `true` when a new command may be read.
    pub fn is_idle(&self) -> bool {
        self.is_drained() && self.serializer.is_idle()
    }

    pub fn tick(&mut self, input: &mut impl ByteSource, output: &mut impl ByteSink) {
        self.ticks += 1;

        let drained = self.is_drained();
        self.serializer.tick(output, drained);

        let accept = self.serializer.is_idle();
        if let Some(result) = self.collector.tick(&mut self.pool, accept) {
            self.serializer.accept(result);
        }

        self.scheduler.tick(&mut self.pool);
        self.pool.tick();

        let enabled = self.is_idle();
        if enabled {
            self.finish_sweep();
        }
        if let Some(ParseEvent::Accepted(view)) = self.parser.tick(input, enabled) {
            self.begin_sweep(view);
        }
    }

    fn begin_sweep(&mut self, view: ViewCommand) {
        self.sweep = Some(SweepStats {
            pixels: view.pixel_count(),
            started_at: self.ticks,
        });
        self.collector.begin_sweep();
        self.serializer.open_frame();
        self.scheduler.begin(view);
    }

    fn finish_sweep(&mut self) {
        if let Some(sweep) = self.sweep.take() {
            debug_assert_eq!(self.collector.collected(), sweep.pixels);
            info!(
                "sweep of {} pixels finished after {} ticks",
                sweep.pixels,
                self.ticks - sweep.started_at
            );
            self.completed_sweeps += 1;
        }
    }

    /// Ticks until `input` has nothing more the device will take and all work is sent.
    ///
    /// `output` must keep becoming ready; a sink that never drains stalls this forever.
    /// Returns the number of ticks spent.
    pub fn run_until_idle(
        &mut self,
        input: &mut impl ByteSource,
        output: &mut impl ByteSink,
    ) -> u64 {
        let start = self.ticks;
        loop {
            self.tick(input, output);
            if self.is_idle() && input.peek().is_none() {
                break;
            }
        }
        self.finish_sweep();
        debug!("ran {} ticks", self.ticks - start);
        self.ticks - start
    }

    /// Sends `view` as a command and returns the result stream it produces.
    pub fn render(&mut self, view: &ViewCommand) -> Vec<u8> {
        let mut input = ByteQueue::from(view.encode());
        let mut output = BeatQueue::unbounded();
        self.run_until_idle(&mut input, &mut output);
        output.drain_payload()
    }
}

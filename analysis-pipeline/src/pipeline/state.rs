use state_machines::state_machine;

state_machine! {
    name: AnalysisMachine,
    state: AnalysisState,
    initial: Connecting,
    states: [Connecting, Fetching, CacheHit, Ranking, Analyzing, Saving, Done, Failed],
    events {
        connect { transition: { from: Connecting, to: Fetching } }
        reuse { transition: { from: Fetching, to: CacheHit } }
        rank { transition: { from: Fetching, to: Ranking } }
        analyze { transition: { from: Ranking, to: Analyzing } }
        save { transition: { from: Analyzing, to: Saving } }
        finish {
            transition: { from: Saving, to: Done }
            transition: { from: CacheHit, to: Done }
        }
        abort {
            transition: { from: Connecting, to: Failed }
            transition: { from: Fetching, to: Failed }
            transition: { from: CacheHit, to: Failed }
            transition: { from: Ranking, to: Failed }
            transition: { from: Analyzing, to: Failed }
            transition: { from: Saving, to: Failed }
        }
    }
}

pub fn connecting() -> AnalysisMachine<(), Connecting> {
    AnalysisMachine::new(())
}

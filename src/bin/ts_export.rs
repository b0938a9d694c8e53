// Writes the TypeScript definitions of the response types to `bindings/`
use learn_module_reader::application::{ErrorBody, NavigationResponse, SectionResponse};
use learn_module_reader::domain::{
    CleanDiagnostics, CleanedContent, ContentBlock, ImageRef, Inline, ListItem, SectionDescriptor, TableCell,
    TableData, TableRow,
};
use learn_module_reader::infrastructure::ErrorKind;
use ts_rs::TS;

fn export<T: TS + 'static>(failures: &mut usize) {
    match T::export() {
        Ok(()) => println!("exported {}", T::name()),
        Err(e) => {
            eprintln!("{} export error: {}", T::name(), e);
            *failures += 1;
        }
    }
}

fn main() {
    let mut failures = 0;

    export::<SectionDescriptor>(&mut failures);
    export::<CleanedContent>(&mut failures);
    export::<ContentBlock>(&mut failures);
    export::<Inline>(&mut failures);
    export::<ImageRef>(&mut failures);
    export::<TableData>(&mut failures);
    export::<TableRow>(&mut failures);
    export::<TableCell>(&mut failures);
    export::<ListItem>(&mut failures);
    export::<CleanDiagnostics>(&mut failures);
    export::<ErrorKind>(&mut failures);
    export::<ErrorBody>(&mut failures);
    export::<NavigationResponse>(&mut failures);
    export::<SectionResponse>(&mut failures);

    if failures > 0 {
        std::process::exit(1);
    }
}

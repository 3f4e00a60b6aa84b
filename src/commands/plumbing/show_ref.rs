use crate::areas::repository::Repository;

impl Repository {
    pub fn show_ref(&self, with_hash: bool) -> anyhow::Result<()> {
        for (name, oid) in self.refs().list()? {
            if with_hash {
                writeln!(self.writer(), "{oid} {name}")?;
            } else {
                writeln!(self.writer(), "{name}")?;
            }
        }

        Ok(())
    }
}

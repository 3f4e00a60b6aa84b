use crate::areas::repository::Repository;
use crate::artifacts::objects::object_type::ObjectType;

impl Repository {
    pub fn rev_parse(&self, name: &str, want: Option<ObjectType>) -> anyhow::Result<()> {
        let oid = self.refs().find(self.database(), name, want)?;

        writeln!(self.writer(), "{oid}")?;

        Ok(())
    }
}
